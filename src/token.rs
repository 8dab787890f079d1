// Copyright 2025 Cornell University
// released under MIT License

use crate::errors::{HeaderError, HeaderResult};
use crate::span::{Span, DELIMITERS};
use log::{debug, warn};
use std::ops::Range;

pub const END_MARKER: &[u8] = b"$end";

/// Keywords that start a record. Seeing one of these inside a value means
/// the previous record lost its `$end`.
pub const RECORD_KEYWORDS: &[&[u8]] = &[
    b"$date",
    b"$version",
    b"$timescale",
    b"$comment",
    b"$scope",
    b"$var",
    b"$upscope",
    b"$enddefinitions",
];

/// Returns the range of the next maximal run of non-delimiter bytes at or after `offset`.
pub fn token_at(buf: &[u8], offset: usize, delimiters: &[u8]) -> Option<Range<usize>> {
    let rest = buf.get(offset..)?;
    let start = offset + rest.iter().position(|b| !delimiters.contains(b))?;
    let end = buf[start..]
        .iter()
        .position(|b| delimiters.contains(b))
        .map_or(buf.len(), |len| start + len);
    Some(start..end)
}

/// A `$key value... $end` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param<'a> {
    pub key: Span<'a>,
    pub value: Span<'a>,
    /// from the first byte of the key to the last byte of `$end`
    pub start: usize,
    pub end: usize,
}

impl Param<'_> {
    pub fn range(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

/// Pulls records out of a header buffer. Shared by every level of the
/// scope recursion so nested parses resume exactly where the inner one stopped.
#[derive(Debug, Clone)]
pub struct ParamReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ParamReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Reads the next record.
    ///
    /// The value keeps its bytes verbatim, minus one delimiter right after
    /// the key and one right before `$end`. Returns `Ok(None)` once the
    /// buffer holds no further key.
    pub fn next_param(&mut self) -> HeaderResult<Option<Param<'a>>> {
        let buf = self.buf;
        let mut key: Option<Range<usize>> = None;
        let mut has_value = false;
        let mut offset = self.pos;

        while let Some(tok) = token_at(buf, offset, DELIMITERS) {
            offset = tok.end;
            let text = &buf[tok.clone()];

            let Some(key_range) = key.clone() else {
                if text == END_MARKER {
                    return Err(HeaderError::EndBeforeKey {
                        range: (tok.start, tok.end),
                    });
                }
                if text.starts_with(b"$") {
                    key = Some(tok);
                } else {
                    warn!(
                        "skipping stray token `{}` outside of any record",
                        text.escape_ascii()
                    );
                }
                continue;
            };

            if text == END_MARKER {
                let value = if has_value {
                    &buf[key_range.end + 1..tok.start - 1]
                } else {
                    &buf[0..0]
                };
                self.pos = tok.end;
                let param = Param {
                    key: Span::new(&buf[key_range.clone()]),
                    value: Span::new(value),
                    start: key_range.start,
                    end: tok.end,
                };
                debug!("record {} '{}'", param.key, param.value);
                return Ok(Some(param));
            }

            if RECORD_KEYWORDS.contains(&text) {
                return Err(HeaderError::MissingEnd {
                    key: buf[key_range.clone()].escape_ascii().to_string(),
                    found: text.escape_ascii().to_string(),
                    range: (key_range.start, tok.end),
                });
            }
            has_value = true;
        }

        self.pos = buf.len();
        match key {
            Some(key_range) => Err(HeaderError::Unterminated {
                key: buf[key_range.clone()].escape_ascii().to_string(),
                range: (key_range.start, buf.len()),
            }),
            None => Ok(None),
        }
    }
}
