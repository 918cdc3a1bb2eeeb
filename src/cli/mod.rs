//! CLI command implementations for Arbor.

pub(crate) mod sample;
pub(crate) mod solve;

mod symreg;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;

/// Output format for the `solve` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<arbor::EngineError> for CliError {
    fn from(e: arbor::EngineError) -> Self {
        Self::new(e.to_string())
    }
}
