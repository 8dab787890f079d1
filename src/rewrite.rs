// Copyright 2025 Cornell University
// released under MIT License

use crate::errors::{Result, RunError};
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Maximum number of spaces on a padding line.
pub const FILL_WIDTH: usize = 80;

/// Size of the buffer used to copy the value change section.
pub const COPY_BUFFER_SIZE: usize = 1 << 20;

/// What happened to the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The new header was padded to `header_len` and written over the old one.
    InPlace { header_len: usize, written: usize },
    /// The new header and the unchanged body went to `path`.
    NewFile {
        path: PathBuf,
        written: usize,
        body_len: u64,
    },
    /// The new header does not fit and nothing was written.
    Refused { candidate_len: usize, budget: usize },
    /// The tree was printed and no file was touched.
    Dumped,
}

/// Pads `candidate` with lines of spaces so it is exactly `budget` bytes long.
///
/// Each padding line holds at most [`FILL_WIDTH`] spaces and ends in a
/// newline, the last line may be shorter. Returns `None` if the candidate
/// is already longer than `budget`.
pub fn pad_to_budget(candidate: &[u8], budget: usize) -> Option<Vec<u8>> {
    if candidate.len() > budget {
        return None;
    }
    let mut out = Vec::with_capacity(budget);
    out.extend_from_slice(candidate);
    while out.len() < budget {
        let fill = (budget - out.len()).min(FILL_WIDTH + 1);
        out.resize(out.len() + fill - 1, b' ');
        out.push(b'\n');
    }
    Some(out)
}

/// Overwrites `region` with `candidate` padded to the region's length.
///
/// Leaves `region` untouched if the candidate does not fit.
pub fn rewrite_in_place(region: &mut [u8], candidate: &[u8]) -> Outcome {
    let budget = region.len();
    match pad_to_budget(candidate, budget) {
        Some(padded) => {
            region.copy_from_slice(&padded);
            info!(
                "rewrote header in place ({} bytes, {} bytes padding)",
                budget,
                budget - candidate.len()
            );
            Outcome::InPlace {
                header_len: budget,
                written: candidate.len(),
            }
        }
        None => Outcome::Refused {
            candidate_len: candidate.len(),
            budget,
        },
    }
}

/// Writes `candidate` to `output`, followed by everything in `input` from
/// byte `header_len` on.
pub fn write_new_file(
    input: &Path,
    header_len: usize,
    output: &Path,
    candidate: &[u8],
) -> Result<Outcome> {
    let mut src = File::open(input).map_err(|e| RunError::io(input, e))?;
    src.seek(SeekFrom::Start(header_len as u64))
        .map_err(|e| RunError::io(input, e))?;
    let dst = File::create(output).map_err(|e| RunError::io(output, e))?;
    let mut dst = BufWriter::new(dst);
    dst.write_all(candidate)
        .map_err(|e| RunError::io(output, e))?;
    let body_len = copy_body(&mut src, &mut dst, input, output)?;
    dst.flush().map_err(|e| RunError::io(output, e))?;
    info!(
        "wrote {} ({} header bytes, {} body bytes)",
        output.display(),
        candidate.len(),
        body_len
    );
    Ok(Outcome::NewFile {
        path: output.to_path_buf(),
        written: candidate.len(),
        body_len,
    })
}

/// Copies `src` to the end through a [`COPY_BUFFER_SIZE`] buffer.
fn copy_body(
    src: &mut impl Read,
    dst: &mut impl Write,
    input: &Path,
    output: &Path,
) -> Result<u64> {
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = match src.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(RunError::io(input, e)),
        };
        dst.write_all(&buf[..n])
            .map_err(|e| RunError::io(output, e))?;
        total += n as u64;
        debug!("copied {total} body bytes");
    }
    Ok(total)
}
