//! CLI command definitions for layered-configs
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod get;

use crate::config::{Options, Resolver};
use crate::error::ConfigsError;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use get::GetArgs;
use serde_json::Value;
use std::path::PathBuf;

/// Directory used when `--dir` is not given.
pub const DEFAULT_CONFIGS_DIR: &str = "configs";

/// Layered YAML configuration loader
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the value at a key (or the whole merged mapping)
    Get(GetArgs),

    /// Validate the file set for the active environment and list it
    Check,
}

/// Where the configuration files live and how they are combined.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Application root (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Config directory relative to the root
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIGS_DIR)]
    pub dir: String,

    /// Environment to load (default: $APP_ENV or development)
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Config files in merge order (default: config.<env>.yaml)
    #[arg(short, long = "file", global = true, value_name = "FILE")]
    pub files: Vec<String>,

    /// Key path separator
    #[arg(long, global = true, default_value = ".")]
    pub delimiter: String,

    /// YAML or JSON file providing ${{ }} interpolation data
    #[arg(long, global = true, value_name = "FILE")]
    pub data: Option<PathBuf>,
}

impl SourceArgs {
    /// Build loader options with a single resolver for the chosen environment.
    pub fn to_options(&self) -> Result<Options> {
        let mut options = Options {
            root: self.root.clone(),
            environment: self.env.clone(),
            path_delimiter: self.delimiter.clone(),
            ..Default::default()
        }
        .normalized();

        let environment = options.active_environment();
        let files = if self.files.is_empty() {
            vec![default_file_for(&environment)]
        } else {
            self.files.clone()
        };

        let mut resolver = Resolver::new(environment, self.dir.clone()).files(files);
        if let Some(path) = &self.data {
            resolver = resolver.with_data_source(load_data(path)?);
        }
        options.resolvers.push(resolver);
        Ok(options)
    }
}

/// Conventional file name for an environment.
pub fn default_file_for(environment: &str) -> String {
    format!("config.{}.yaml", environment)
}

/// Read an interpolation context; YAML is a superset of JSON so one parser
/// covers both.
pub fn load_data(path: &std::path::Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file {}", path.display()))?;
    let value = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse data file {}", path.display()))?;
    Ok(value)
}

/// The single stderr line printed when a command fails. Construction
/// failures carry their kind name.
pub fn error_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<ConfigsError>() {
        Some(e) => format!("{}: {}", e.kind(), e),
        None => format!("Error: {error:#}"),
    }
}
