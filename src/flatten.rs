// Copyright 2025 Cornell University
// released under MIT License

use crate::errors::HeaderResult;
use crate::ir::*;
use crate::span::{Name, PATH_SEPARATOR};
use log::debug;
use std::borrow::Cow;

/// Collapses every top module into a single scope.
///
/// Signals are renamed to their dotted path below the top module and
/// listed by symbol. Ties keep the depth first visiting order.
pub fn flatten<'a>(src: &Header<'a>) -> HeaderResult<Header<'a>> {
    let mut dst = Header::with_fields(src.fields);
    for top in src.top_modules() {
        let mut signals = Vec::new();
        collect_signals(src, top, &mut signals);
        // stable, so equal symbols stay in visiting order
        signals.sort_by_key(|id| src[*id].symbol);

        let id = dst.add_module(src[top].name.clone(), src[top].kind, None)?;
        dst.set_order(id, VarOrder::BySymbol);
        for signal in signals {
            let s = &src[signal];
            dst.push_signal(s.kind, s.width, s.symbol, full_name(src, top, signal), id);
        }
        debug!(
            "flattened {} into {} signals",
            src[top].name.escape_ascii(),
            dst[id].num_signals()
        );
    }
    Ok(dst)
}

/// Depth first: the module's own signals in declaration order, then each child.
fn collect_signals(h: &Header, module: ModuleId, out: &mut Vec<SignalId>) {
    out.extend(h.vars(module));
    for child in h[module].children() {
        collect_signals(h, child, out);
    }
}

/// Dotted path from just below `top` down to the signal.
fn full_name<'a>(h: &Header<'a>, top: ModuleId, signal: SignalId) -> Name<'a> {
    let s = &h[signal];
    if s.parent == top {
        return s.name.clone();
    }
    let path = h.path(s.parent);
    let mut name = Vec::new();
    // path starts at the top module, which is not part of the name
    for segment in path.iter().skip(1) {
        name.extend_from_slice(segment);
        name.push(PATH_SEPARATOR);
    }
    name.extend_from_slice(&s.name);
    Cow::Owned(name)
}
