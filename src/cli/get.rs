//! Get subcommand for layered-configs CLI
//!
//! Resolves the merged configuration and prints the value at a key.

use crate::format::OutputFormat;
use clap::Args;

/// Arguments for the get subcommand
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Delimited key path; empty prints the whole mapping
    #[arg(default_value = "")]
    pub key: String,

    /// Output format: json or yaml
    #[arg(long, default_value = "json")]
    pub format: String,
}

impl GetArgs {
    /// Parsed output format, falling back to JSON for unknown names.
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_str(&self.format).unwrap_or_default()
    }
}
