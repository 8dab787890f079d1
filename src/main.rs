// Copyright 2025 Cornell University
// released under MIT License

use anyhow::Context;
use clap::{ColorChoice, Parser};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use log::info;
use std::path::PathBuf;
use std::process::exit;
use vcd_hier::diagnostic::DiagnosticHandler;
use vcd_hier::errors::RunError;
use vcd_hier::rewrite::Outcome;
use vcd_hier::run::{run, FormatChoice, RunConfig, Transform};

/// Exit code when the new header does not fit and no output file was given
const EXIT_REFUSED: i32 = 3;

/// Rebuilds the scope hierarchy of a VCD header from dotted signal names,
/// or flattens it, without touching the value changes.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the VCD file
    #[arg(value_name = "VCD_FILE")]
    input: PathBuf,

    /// Collapse every top scope into one with dotted signal names
    #[arg(long)]
    flatten: bool,

    /// Write the result here instead of rewriting the input in place.
    /// Required when the new header is larger than the old one.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Layout of the new header
    #[arg(long, value_enum, default_value_t = FormatChoice::Auto)]
    format: FormatChoice,

    /// Print the transformed tree and write nothing
    #[arg(long)]
    dump: bool,

    /// Users can specify `-v` or `--verbose` to toggle logging
    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,

    /// To suppress colors in error messages, pass in `--color never`
    /// Otherwise, by default, error messages are displayed w/ ANSI colors
    #[arg(long, value_name = "COLOR_CHOICE", default_value = "auto")]
    color: ColorChoice,
}

// $ cargo run -- --flatten -o flat.vcd tests/inputs/nested.vcd
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // For concision, we disable timestamps in the log
    let mut logger = env_logger::Builder::new();
    logger
        .format_timestamp(None)
        .filter_level(cli.verbosity.log_level_filter());
    if cli.color == ColorChoice::Never {
        logger.write_style(env_logger::WriteStyle::Never);
    }
    logger.init();

    let config = RunConfig {
        input: cli.input,
        output: cli.output,
        transform: if cli.flatten {
            Transform::Flatten
        } else {
            Transform::Hierarchy
        },
        format: cli.format,
        dump: cli.dump,
    };
    let mut handler = DiagnosticHandler::new(cli.color);

    let outcome = match run(&config, &mut handler, &mut std::io::stdout().lock()) {
        Ok(outcome) => outcome,
        // the handler already printed it
        Err(RunError::Header { .. }) => exit(1),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to rewrite {}", config.input.display()))
        }
    };

    match outcome {
        Outcome::InPlace {
            header_len,
            written,
        } => info!(
            "updated {} in place, {} bytes of padding",
            config.input.display(),
            header_len - written
        ),
        Outcome::NewFile { path, .. } => info!("wrote {}", path.display()),
        Outcome::Dumped => {}
        Outcome::Refused {
            candidate_len,
            budget,
        } => {
            eprintln!(
                "could not rewrite {} in place: the new header needs {} bytes, only {} are available",
                config.input.display(),
                candidate_len,
                budget
            );
            eprintln!("nothing was written. Please add the --output option (or try --format compact)");
            exit(EXIT_REFUSED);
        }
    }
    Ok(())
}
