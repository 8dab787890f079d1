// Copyright 2025 Cornell University
// released under MIT License

use std::path::PathBuf;
use thiserror::Error;

/// Byte range `(start, end)` inside the header buffer.
pub type Range = (usize, usize);

/// Fatal problems with the header text or with the tree built from it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// `$end` showed up where a record key was expected
    #[error("found `$end` before any record key")]
    EndBeforeKey { range: Range },
    /// the header ended inside a record
    #[error("record `{key}` is missing its `$end`")]
    Unterminated { key: String, range: Range },
    /// another record keyword appeared before the terminating `$end`
    #[error("record `{key}` runs into `{found}` before its `$end`")]
    MissingEnd {
        key: String,
        found: String,
        range: Range,
    },
    #[error("`{field}` is set more than once")]
    DuplicateField { field: &'static str, range: Range },
    #[error("malformed `$scope` record, expected `$scope <type> <name> $end`")]
    MalformedScope { range: Range },
    #[error("scope `{name}` is never closed with `$upscope`")]
    UnclosedScope { name: String, range: Range },
    #[error("`$upscope` without a matching `$scope`")]
    UnmatchedUpscope { range: Range },
    #[error("malformed `$var` record: {reason}")]
    MalformedVar { reason: &'static str, range: Range },
    #[error("unsupported signal kind `{kind}`, expected `wire` or `real`")]
    UnknownSignalKind { kind: String, range: Range },
    #[error("duplicate module `{name}`")]
    DuplicateModule { name: String, range: Option<Range> },
    #[error("duplicate signal `{name}` in module `{module}`")]
    DuplicateSignal {
        name: String,
        module: String,
        range: Option<Range>,
    },
}

impl HeaderError {
    /// Location of the offending bytes, when the error can be traced back to the header text.
    pub fn range(&self) -> Option<Range> {
        match self {
            HeaderError::EndBeforeKey { range }
            | HeaderError::Unterminated { range, .. }
            | HeaderError::MissingEnd { range, .. }
            | HeaderError::DuplicateField { range, .. }
            | HeaderError::MalformedScope { range }
            | HeaderError::UnclosedScope { range, .. }
            | HeaderError::UnmatchedUpscope { range }
            | HeaderError::MalformedVar { range, .. }
            | HeaderError::UnknownSignalKind { range, .. } => Some(*range),
            HeaderError::DuplicateModule { range, .. }
            | HeaderError::DuplicateSignal { range, .. } => *range,
        }
    }
}

pub type HeaderResult<T> = std::result::Result<T, HeaderError>;

/// Errors that end a run of the tool.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("invalid header in {path}: {source}")]
    Header {
        path: PathBuf,
        #[source]
        source: HeaderError,
    },
    #[error("no `$enddefinitions $end` line found in {0}")]
    MissingEnddefinitions(PathBuf),
    #[error("output {0} is the input file")]
    OutputIsInput(PathBuf),
    #[error("failed to perform i/o on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunError>;
