//! Text and JSON rendering shared by all commands

use serde::Serialize;

use crate::storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl From<storage::OutputFormat> for OutputFormat {
    fn from(format: storage::OutputFormat) -> Self {
        match format {
            storage::OutputFormat::Text => Self::Text,
            storage::OutputFormat::Json => Self::Json,
        }
    }
}

/// Where command results go
///
/// Results and confirmations go to stdout; warnings and `--verbose`
/// diagnostics go to stderr so JSON on stdout stays parseable.
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Confirms a completed action
    pub fn success(&self, message: &str) {
        if self.is_json() {
            println!("{}", serde_json::json!({ "success": true, "message": message }));
        } else {
            println!("{}", message);
        }
    }

    pub fn warn(&self, message: &str) {
        if self.is_json() {
            eprintln!("{}", serde_json::json!({ "warning": message }));
        } else {
            eprintln!("Warning: {}", message);
        }
    }

    /// Prints a value as a single line of JSON
    ///
    /// Commands render their own text tables and only call this in JSON mode.
    pub fn data<T: Serialize>(&self, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => println!("{}", json),
            Err(e) => self.warn(&format!("Failed to serialize output: {}", e)),
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", message);
        }
    }

    /// Like [`Output::verbose`], tagged with the command it came from
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }
}
