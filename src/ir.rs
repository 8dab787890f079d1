// Copyright 2025 Cornell University
// released under MIT License

use crate::errors::{HeaderError, HeaderResult, Range};
use crate::span::{Name, Span};
use cranelift_entity::{entity_impl, PrimaryMap};
use std::collections::BTreeMap;
use std::ops::Index;

#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ModuleId(u32);
entity_impl!(ModuleId, "module");

#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SignalId(u32);
entity_impl!(SignalId, "signal");

/// The scope type every scope created by a transform gets.
pub const MODULE_SCOPE: &[u8] = b"module";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Wire,
    Real,
}

impl SignalKind {
    pub fn from_token(tok: &[u8]) -> Option<Self> {
        match tok {
            b"wire" => Some(SignalKind::Wire),
            b"real" => Some(SignalKind::Real),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Wire => "wire",
            SignalKind::Real => "real",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal<'a> {
    pub kind: SignalKind,
    pub width: Span<'a>,
    pub symbol: Span<'a>,
    pub name: Name<'a>,
    pub parent: ModuleId,
}

/// Order in which a module lists its `$var` declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarOrder {
    #[default]
    ByName,
    /// by symbol, ties keep the order in which the signals were added
    BySymbol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module<'a> {
    pub name: Name<'a>,
    /// scope type, e.g. `module`
    pub kind: Span<'a>,
    pub parent: Option<ModuleId>,
    pub order: VarOrder,
    /// every signal of the module, in the order it was added
    signals: Vec<SignalId>,
    /// name lookup, the first signal added under a name wins
    by_name: BTreeMap<Name<'a>, SignalId>,
    children: BTreeMap<Name<'a>, ModuleId>,
}

impl<'a> Module<'a> {
    pub fn new(name: Name<'a>, kind: Span<'a>, parent: Option<ModuleId>) -> Self {
        Self {
            name,
            kind,
            parent,
            order: VarOrder::default(),
            signals: Vec::new(),
            by_name: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn is_top(&self) -> bool {
        self.parent.is_none()
    }

    pub fn signal(&self, name: &[u8]) -> Option<SignalId> {
        self.by_name.get(name).copied()
    }

    pub fn child(&self, name: &[u8]) -> Option<ModuleId> {
        self.children.get(name).copied()
    }

    /// Signals in the order they were added. See [`Header::vars`] for
    /// declaration order.
    pub fn signals(&self) -> impl Iterator<Item = SignalId> + '_ {
        self.signals.iter().copied()
    }

    /// Child modules in name order.
    pub fn children(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.children.values().copied()
    }

    pub fn num_signals(&self) -> usize {
        self.signals.len()
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }
}

/// Which free-text record a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    Version,
    Timescale,
    Comment,
}

/// Maps record keywords to the field they set.
pub const FIELD_KEYS: [(&[u8], Field); 4] = [
    (b"$date", Field::Date),
    (b"$version", Field::Version),
    (b"$timescale", Field::Timescale),
    (b"$comment", Field::Comment),
];

impl Field {
    pub fn from_key(key: &[u8]) -> Option<Self> {
        FIELD_KEYS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, field)| *field)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Field::Date => "$date",
            Field::Version => "$version",
            Field::Timescale => "$timescale",
            Field::Comment => "$comment",
        }
    }
}

/// Free-text header fields, each set at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fields<'a> {
    pub date: Option<Span<'a>>,
    pub version: Option<Span<'a>>,
    pub timescale: Option<Span<'a>>,
    pub comment: Option<Span<'a>>,
}

impl<'a> Fields<'a> {
    fn slot_mut(&mut self, field: Field) -> &mut Option<Span<'a>> {
        match field {
            Field::Date => &mut self.date,
            Field::Version => &mut self.version,
            Field::Timescale => &mut self.timescale,
            Field::Comment => &mut self.comment,
        }
    }

    /// Value of `field`, empty if it never appeared.
    pub fn get(&self, field: Field) -> Span<'a> {
        let value = match field {
            Field::Date => self.date,
            Field::Version => self.version,
            Field::Timescale => self.timescale,
            Field::Comment => self.comment,
        };
        value.unwrap_or_default()
    }

    pub fn set(&mut self, field: Field, value: Span<'a>, range: Range) -> HeaderResult<()> {
        let slot = self.slot_mut(field);
        if slot.is_some() {
            return Err(HeaderError::DuplicateField {
                field: field.keyword(),
                range,
            });
        }
        *slot = Some(value);
        Ok(())
    }
}

/// A parsed (or transformed) VCD header. Owns every module and signal below it;
/// parent links are indices into the arenas, never owning.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header<'a> {
    pub fields: Fields<'a>,
    top: BTreeMap<Name<'a>, ModuleId>,
    modules: PrimaryMap<ModuleId, Module<'a>>,
    signals: PrimaryMap<SignalId, Signal<'a>>,
}

impl<'a> Header<'a> {
    /// An empty header carrying over the free-text fields of `fields`.
    pub fn with_fields(fields: Fields<'a>) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    /// Adds a module. Fails if its parent (or the top level) already has a module of that name.
    pub fn add_module(
        &mut self,
        name: Name<'a>,
        kind: Span<'a>,
        parent: Option<ModuleId>,
    ) -> HeaderResult<ModuleId> {
        let taken = match parent {
            Some(p) => self.modules[p].children.contains_key(&name),
            None => self.top.contains_key(&name),
        };
        if taken {
            return Err(HeaderError::DuplicateModule {
                name: name.escape_ascii().to_string(),
                range: None,
            });
        }
        let id = self.modules.push(Module::new(name.clone(), kind, parent));
        match parent {
            Some(p) => self.modules[p].children.insert(name, id),
            None => self.top.insert(name, id),
        };
        Ok(id)
    }

    /// Returns the child `name` of `parent`, creating a `module` scope if it does not exist yet.
    pub fn child_or_insert(&mut self, parent: ModuleId, name: Name<'a>) -> ModuleId {
        if let Some(id) = self.modules[parent].child(&name) {
            return id;
        }
        let id = self
            .modules
            .push(Module::new(name.clone(), Span::new(MODULE_SCOPE), Some(parent)));
        self.modules[parent].children.insert(name, id);
        id
    }

    /// Adds a signal to `parent`. Fails if the module already has a signal of that name.
    pub fn add_signal(
        &mut self,
        kind: SignalKind,
        width: Span<'a>,
        symbol: Span<'a>,
        name: Name<'a>,
        parent: ModuleId,
    ) -> HeaderResult<SignalId> {
        if self.modules[parent].by_name.contains_key(&name) {
            return Err(HeaderError::DuplicateSignal {
                name: name.escape_ascii().to_string(),
                module: self.modules[parent].name.escape_ascii().to_string(),
                range: None,
            });
        }
        Ok(self.push_signal(kind, width, symbol, name, parent))
    }

    /// Adds a signal to `parent` even if the module already has one of that
    /// name. Flattened scopes can end up with repeated dotted names.
    pub fn push_signal(
        &mut self,
        kind: SignalKind,
        width: Span<'a>,
        symbol: Span<'a>,
        name: Name<'a>,
        parent: ModuleId,
    ) -> SignalId {
        let id = self.signals.push(Signal {
            kind,
            width,
            symbol,
            name: name.clone(),
            parent,
        });
        let module = &mut self.modules[parent];
        module.signals.push(id);
        module.by_name.entry(name).or_insert(id);
        id
    }

    pub fn set_order(&mut self, module: ModuleId, order: VarOrder) {
        self.modules[module].order = order;
    }

    pub fn top(&self, name: &[u8]) -> Option<ModuleId> {
        self.top.get(name).copied()
    }

    /// Top level modules in name order.
    pub fn top_modules(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.top.values().copied()
    }

    pub fn num_modules(&self) -> usize {
        self.modules.len()
    }

    pub fn num_signals(&self) -> usize {
        self.signals.len()
    }

    pub fn signal_ids(&self) -> impl Iterator<Item = SignalId> + '_ {
        self.signals.keys()
    }

    /// Signals of `module` in the order they are declared in the output.
    pub fn vars(&self, module: ModuleId) -> Vec<SignalId> {
        let m = &self.modules[module];
        let mut ids: Vec<SignalId> = m.signals().collect();
        // arena ids grow in insertion order, which breaks ties
        match m.order {
            VarOrder::ByName => ids.sort_by(|a, b| {
                (&self.signals[*a].name, a).cmp(&(&self.signals[*b].name, b))
            }),
            VarOrder::BySymbol => ids.sort_by_key(|id| (self.signals[*id].symbol, *id)),
        }
        ids
    }

    /// Names of the modules from the top module down to `module`, inclusive.
    pub fn path(&self, module: ModuleId) -> Vec<&Name<'a>> {
        let mut path = Vec::new();
        let mut cur = Some(module);
        while let Some(id) = cur {
            path.push(&self.modules[id].name);
            cur = self.modules[id].parent;
        }
        path.reverse();
        path
    }

    /// Walks a dot free path like `["top", "cpu", "alu"]` from the top level.
    pub fn find_module<'n>(&self, path: impl IntoIterator<Item = &'n [u8]>) -> Option<ModuleId> {
        let mut path = path.into_iter();
        let mut cur = self.top(path.next()?)?;
        for name in path {
            cur = self.modules[cur].child(name)?;
        }
        Some(cur)
    }
}

impl<'a> Index<ModuleId> for Header<'a> {
    type Output = Module<'a>;

    fn index(&self, index: ModuleId) -> &Self::Output {
        &self.modules[index]
    }
}

impl<'a> Index<SignalId> for Header<'a> {
    type Output = Signal<'a>;

    fn index(&self, index: SignalId) -> &Self::Output {
        &self.signals[index]
    }
}
