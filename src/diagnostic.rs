// Copyright 2025 Cornell University
// released under MIT License

use std::io::Write;

use clap::ColorChoice;
use codespan_reporting::diagnostic::{
    Diagnostic as CodespanDiagnostic, Label as CodespanLabel, LabelStyle, Severity,
};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{Buffer, Color, ColorSpec, WriteColor};

use crate::errors::{HeaderError, Range};
use log::debug;

/// A label representing a part of the header
#[derive(Debug, Clone, PartialEq, Eq)]
struct Label {
    message: Option<String>,
    range: Range,
}

impl Label {
    fn to_codespan_label(&self, fileid: usize) -> CodespanLabel<usize> {
        CodespanLabel::new(LabelStyle::Primary, fileid, self.range.0..self.range.1)
            .with_message(self.message.clone().unwrap_or_default())
    }
}

/// Diagnostic of a particular part of a header
struct Diagnostic {
    title: String,
    message: String,
    location: Option<(usize, Label)>,
}

impl Diagnostic {
    fn emit(&self, buffer: &mut Buffer, files: &SimpleFiles<String, String>) {
        if let Some((fileid, label)) = &self.location {
            let diagnostic = CodespanDiagnostic::new(Severity::Error)
                .with_message(&self.message)
                .with_labels(vec![label.to_codespan_label(*fileid)]);
            let config = term::Config::default();
            match term::emit(buffer, &config, files, &diagnostic) {
                Ok(()) => return,
                Err(e) => debug!("cannot point into the header: {e}"),
            }
        }
        buffer
            .set_color(ColorSpec::new().set_bold(true).set_fg(Some(Color::Red)))
            .expect("Failed to set color");
        writeln!(buffer, "{}", self.title).expect("Failed to write title");
        buffer
            .set_color(&ColorSpec::new())
            .expect("Failed to reset color");
    }
}

/// Renders header errors, optionally pointing into the header text.
///
/// Everything emitted is also kept in [`DiagnosticHandler::error_string`].
pub struct DiagnosticHandler {
    files: SimpleFiles<String, String>,
    error_string: String,
    /// `color_choice` indicates whether to emit error messages w/ ANSI colors
    color_choice: ColorChoice,
}

impl Default for DiagnosticHandler {
    /// Default `DiagnosticHandler` does not emit colored error messages
    fn default() -> Self {
        Self::new(ColorChoice::Never)
    }
}

impl DiagnosticHandler {
    pub fn new(color_choice: ColorChoice) -> Self {
        Self {
            files: SimpleFiles::new(),
            error_string: String::new(),
            color_choice,
        }
    }

    /// Creates a buffer for error diagnostics
    /// (different buffers are created based on whether we want colors or not)
    fn create_buffer(&self) -> Buffer {
        if self.color_choice == ColorChoice::Never {
            Buffer::no_color()
        } else {
            Buffer::ansi()
        }
    }

    pub fn add_file(&mut self, name: String, content: String) -> usize {
        self.files.add(name, content)
    }

    /// Registers the header bytes so errors can point into them.
    /// Headers that are not valid UTF-8 cannot be shown and return `None`.
    pub fn add_header(&mut self, name: String, header: &[u8]) -> Option<usize> {
        let content = std::str::from_utf8(header).ok()?;
        Some(self.add_file(name, content.to_string()))
    }

    pub fn error_string(&self) -> &str {
        &self.error_string
    }

    /// Reports `err` on stderr, with a label over the offending bytes if
    /// `fileid` was registered and the error has a location.
    pub fn emit_header_error(&mut self, fileid: Option<usize>, err: &HeaderError) {
        let message = err.to_string();
        let location = fileid.zip(err.range()).map(|(fileid, range)| {
            let label = Label {
                message: Some(message.clone()),
                range,
            };
            (fileid, label)
        });
        let diagnostic = Diagnostic {
            title: format!("error: {message}"),
            message,
            location,
        };
        let mut buffer = self.create_buffer();
        diagnostic.emit(&mut buffer, &self.files);
        let error_msg = String::from_utf8_lossy(buffer.as_slice());
        self.error_string.push_str(&error_msg);
        eprint!("{}", error_msg);
    }
}
