// Copyright 2025 Cornell University
// released under MIT License

use crate::errors::{Result, RunError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The line separating the header from the value change section.
pub const SENTINEL: &[u8] = b"$enddefinitions $end";

/// Length of the header in bytes, including the sentinel line and its newline.
///
/// Returns `None` if no line is exactly [`SENTINEL`]. CRLF line endings are
/// not supported, so `$enddefinitions $end\r\n` does not match.
pub fn scan_header_len(mut reader: impl BufRead) -> std::io::Result<Option<usize>> {
    let mut size = 0;
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            return Ok(None);
        }
        size += read;
        if line.strip_suffix(b"\n").unwrap_or(&line[..]) == SENTINEL {
            return Ok(Some(size));
        }
    }
}

/// Finds the header length of the VCD file at `path`.
pub fn header_len(path: &Path) -> Result<usize> {
    let file = File::open(path).map_err(|e| RunError::io(path, e))?;
    scan_header_len(BufReader::new(file))
        .map_err(|e| RunError::io(path, e))?
        .ok_or_else(|| RunError::MissingEnddefinitions(path.to_path_buf()))
}
