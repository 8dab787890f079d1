// Copyright 2025 Cornell University
// released under MIT License

//! Shared VCD inputs for unit tests.

use crate::scan::scan_header_len;

/// Single `top` scope whose signal names carry the hierarchy (`cpu.alu.sum`).
pub const DOTTED: &str = include_str!("../tests/inputs/dotted.vcd");

/// Hierarchy expressed through nested scopes.
pub const NESTED: &str = include_str!("../tests/inputs/nested.vcd");

/// The header of `src`, up to and including the `$enddefinitions $end` line.
pub fn header_part(src: &str) -> &str {
    let len = scan_header_len(src.as_bytes())
        .unwrap()
        .expect("fixture without header");
    &src[..len]
}
