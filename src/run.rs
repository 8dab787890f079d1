// Copyright 2025 Cornell University
// released under MIT License

use crate::diagnostic::DiagnosticHandler;
use crate::errors::{HeaderError, Result, RunError};
use crate::flatten::flatten;
use crate::hierarchy::make_hierarchy;
use crate::ir::Header;
use crate::mapping::MappedFile;
use crate::parser::parse_header;
use crate::rewrite::{rewrite_in_place, write_new_file, Outcome};
use crate::scan::header_len;
use crate::serialize::{dump, serialize_to_vec, Style};
use clap::ValueEnum;
use log::info;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    /// turn dotted signal names into nested scopes
    #[default]
    Hierarchy,
    /// collapse every top scope into one, ordered by symbol
    Flatten,
}

/// Which serialization style to use for the new header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatChoice {
    /// indented, or compact if indented does not fit in place
    #[default]
    Auto,
    Indented,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub input: PathBuf,
    /// write header and body here instead of rewriting `input` in place
    pub output: Option<PathBuf>,
    pub transform: Transform,
    pub format: FormatChoice,
    /// print the transformed tree instead of writing anything
    pub dump: bool,
}

impl RunConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            transform: Transform::default(),
            format: FormatChoice::default(),
            dump: false,
        }
    }
}

/// Transforms the header of `config.input`.
///
/// Parse errors are rendered through `handler` before they are returned.
/// With `dump` set, the transformed tree goes to `dump_out` and no file is
/// written.
pub fn run(
    config: &RunConfig,
    handler: &mut DiagnosticHandler,
    dump_out: &mut impl Write,
) -> Result<Outcome> {
    let input = config.input.as_path();
    if let Some(output) = &config.output {
        if same_file(input, output) {
            return Err(RunError::OutputIsInput(output.clone()));
        }
    }
    let budget = header_len(input)?;
    let in_place = config.output.is_none() && !config.dump;
    let mut mapped = MappedFile::open(input, in_place, Some(budget))?;

    let candidate = {
        let report = |handler: &mut DiagnosticHandler, source: HeaderError| {
            let fileid = handler.add_header(input.display().to_string(), mapped.as_bytes());
            handler.emit_header_error(fileid, &source);
            RunError::Header {
                path: input.to_path_buf(),
                source,
            }
        };
        let header = parse_header(mapped.as_bytes()).map_err(|e| report(handler, e))?;
        let tree = match config.transform {
            Transform::Hierarchy => make_hierarchy(&header),
            Transform::Flatten => flatten(&header),
        }
        .map_err(|e| report(handler, e))?;

        if config.dump {
            dump(dump_out, &tree).map_err(|e| RunError::io("<stdout>", e))?;
            None
        } else {
            let candidate = render(&tree, config.format, in_place.then_some(budget))
                .map_err(|e| RunError::io(input, e))?;
            Some(candidate)
        }
    };
    let Some(candidate) = candidate else {
        mapped.close()?;
        return Ok(Outcome::Dumped);
    };
    info!("header size {} -> {}", budget, candidate.len());

    let outcome = match &config.output {
        Some(output) => write_new_file(input, budget, output, &candidate)?,
        None => match mapped.as_bytes_mut() {
            Some(region) => rewrite_in_place(region, &candidate),
            None => return Err(read_only(input)),
        },
    };
    mapped.close()?;
    Ok(outcome)
}

/// Serializes `tree` in the requested style. `Auto` only falls back to
/// compact when there is a `budget` the indented form exceeds.
fn render(
    tree: &Header,
    format: FormatChoice,
    budget: Option<usize>,
) -> std::io::Result<Vec<u8>> {
    match format {
        FormatChoice::Indented => serialize_to_vec(tree, Style::Indented),
        FormatChoice::Compact => serialize_to_vec(tree, Style::Compact),
        FormatChoice::Auto => {
            let indented = serialize_to_vec(tree, Style::Indented)?;
            match budget {
                Some(budget) if indented.len() > budget => {
                    info!(
                        "indented header needs {} of {} bytes, trying compact",
                        indented.len(),
                        budget
                    );
                    serialize_to_vec(tree, Style::Compact)
                }
                _ => Ok(indented),
            }
        }
    }
}

/// Whether both paths name the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn read_only(path: &Path) -> RunError {
    RunError::io(
        path,
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "mapped read-only"),
    )
}
