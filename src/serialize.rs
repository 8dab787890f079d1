// Copyright 2025 Cornell University
// released under MIT License

use crate::ir::*;
use std::io::Write;

/// Terminates every serialized header.
pub const ENDDEFINITIONS: &[u8] = b"$enddefinitions $end\n";

/// Layout of a serialized header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// one tab per nesting level, blank lines between sections
    Indented,
    /// no indentation and no empty records
    Compact,
}

pub fn serialize_to_vec(h: &Header, style: Style) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    serialize(&mut out, h, style)?;
    Ok(out)
}

pub fn serialize(out: &mut impl Write, h: &Header, style: Style) -> std::io::Result<()> {
    for field in [Field::Date, Field::Version, Field::Timescale] {
        if serialize_field(out, h, field, style)? && style == Style::Indented {
            writeln!(out)?;
        }
    }
    for top in h.top_modules() {
        serialize_scope(out, h, top, 0, style)?;
    }
    if style == Style::Indented {
        writeln!(out)?;
    }
    serialize_field(out, h, Field::Comment, style)?;
    out.write_all(ENDDEFINITIONS)
}

/// Returns whether the record was written.
fn serialize_field(
    out: &mut impl Write,
    h: &Header,
    field: Field,
    style: Style,
) -> std::io::Result<bool> {
    let value = h.fields.get(field);
    if style == Style::Compact && value.is_empty() {
        return Ok(false);
    }
    writeln!(out, "{}", field.keyword())?;
    out.write_all(value.as_bytes())?;
    out.write_all(b"\n$end\n")?;
    Ok(true)
}

fn indent(style: Style, depth: usize) -> String {
    match style {
        Style::Indented => "\t".repeat(depth),
        Style::Compact => String::new(),
    }
}

fn serialize_scope(
    out: &mut impl Write,
    h: &Header,
    id: ModuleId,
    depth: usize,
    style: Style,
) -> std::io::Result<()> {
    let m = &h[id];
    write!(out, "{}$scope ", indent(style, depth))?;
    out.write_all(m.kind.as_bytes())?;
    out.write_all(b" ")?;
    out.write_all(&m.name)?;
    out.write_all(b" $end\n")?;
    for signal in h.vars(id) {
        let s = &h[signal];
        write!(out, "{}$var {} ", indent(style, depth + 1), s.kind.as_str())?;
        out.write_all(s.width.as_bytes())?;
        out.write_all(b" ")?;
        out.write_all(s.symbol.as_bytes())?;
        out.write_all(b" ")?;
        out.write_all(&s.name)?;
        out.write_all(b" $end\n")?;
    }
    for child in h[id].children() {
        serialize_scope(out, h, child, depth + 1, style)?;
    }
    writeln!(out, "{}$upscope $end", indent(style, depth))
}

/// Human readable tree of fields, scopes and signals, for debugging.
pub fn dump(out: &mut impl Write, h: &Header) -> std::io::Result<()> {
    for field in [Field::Date, Field::Version, Field::Timescale, Field::Comment] {
        writeln!(out, "{}: {:?}", &field.keyword()[1..], h.fields.get(field))?;
    }
    for top in h.top_modules() {
        dump_scope(out, h, top, 0)?;
    }
    Ok(())
}

fn dump_scope(out: &mut impl Write, h: &Header, id: ModuleId, level: usize) -> std::io::Result<()> {
    let m = &h[id];
    writeln!(
        out,
        "{}scope {} '{}'",
        "  ".repeat(level),
        m.kind,
        m.name.escape_ascii()
    )?;
    for signal in h.vars(id) {
        let s = &h[signal];
        writeln!(
            out,
            "{}var {} {} {} '{}'",
            "  ".repeat(level + 1),
            s.kind.as_str(),
            s.width,
            s.symbol,
            s.name.escape_ascii()
        )?;
    }
    for child in m.children() {
        dump_scope(out, h, child, level + 1)?;
    }
    Ok(())
}
