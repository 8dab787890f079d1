// Copyright 2025 Cornell University
// released under MIT License

use std::borrow::Cow;
use std::fmt;

/// Bytes that separate tokens inside a header record.
pub const DELIMITERS: &[u8] = b" \t\n";

/// Separator between the segments of a hierarchical signal name.
pub const PATH_SEPARATOR: u8 = b'.';

/// A view into the header buffer. Never owns memory and cannot outlive the
/// buffer it was cut from.
///
/// Spans order byte-wise over unsigned byte values, which is the order
/// used for every map key and for sorting by symbol.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span<'a>(&'a [u8]);

impl<'a> Span<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Removes trailing delimiter bytes.
    pub fn chomp(&self) -> Span<'a> {
        Span(chomp(self.0))
    }

    /// Offset of this span relative to the start of `base`, if the span was cut from it.
    pub fn offset_in(&self, base: &[u8]) -> Option<usize> {
        let start = base.as_ptr() as usize;
        let ours = self.0.as_ptr() as usize;
        (ours >= start && ours + self.0.len() <= start + base.len()).then(|| ours - start)
    }

    /// Turns the span into a name borrowing the same bytes.
    pub fn to_name(self) -> Name<'a> {
        Cow::Borrowed(self.0)
    }
}

impl<'a> From<&'a [u8]> for Span<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }
}

impl<'a> From<&'a str> for Span<'a> {
    fn from(s: &'a str) -> Self {
        Self(s.as_bytes())
    }
}

impl PartialEq<[u8]> for Span<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Span<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for Span<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

impl fmt::Debug for Span<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.0.escape_ascii())
    }
}

/// Name of a module or signal. Parsed names borrow from the header buffer,
/// names synthesized by a transform (e.g. dotted paths) own their bytes.
pub type Name<'a> = Cow<'a, [u8]>;

/// Splits `name` at its first [`PATH_SEPARATOR`] into `(segment, remainder)`.
///
/// Returns `None` if there is no separator, or if either side of it would be empty.
pub fn split_path<'a>(name: &Name<'a>) -> Option<(Name<'a>, Name<'a>)> {
    let bytes: &[u8] = name;
    let dot = bytes.iter().position(|&b| b == PATH_SEPARATOR)?;
    if dot == 0 || dot + 1 == bytes.len() {
        return None;
    }
    Some(match *name {
        Cow::Borrowed(b) => (Cow::Borrowed(&b[..dot]), Cow::Borrowed(&b[dot + 1..])),
        Cow::Owned(ref v) => (Cow::Owned(v[..dot].to_vec()), Cow::Owned(v[dot + 1..].to_vec())),
    })
}

/// Strips trailing space, tab and newline bytes.
pub fn chomp(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !DELIMITERS.contains(b))
        .map_or(0, |last| last + 1);
    &bytes[..end]
}
