//! Application context that holds resolved configuration
//!
//! The context is built following the precedence order:
//! 1. Default values
//! 2. Config file values
//! 3. Environment variables (`STRATA_*`)
//! 4. CLI flags
//!
//! Once built, the context is passed as read-only throughout the application.

use crate::config;
use crate::format::{self, ColorChoice, OutputFormatter};
use libstrata::{Config, Registry};
use std::path::PathBuf;

/// How much diagnostic output to emit on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    Normal,
    Verbose,
    Debug,
    Trace,
}

impl VerbosityLevel {
    /// Map the number of `-v` flags to a level
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Normal,
            1 => VerbosityLevel::Verbose,
            2 => VerbosityLevel::Debug,
            _ => VerbosityLevel::Trace,
        }
    }

    /// Default tracing filter for this level
    pub fn filter_directive(self) -> &'static str {
        match self {
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "info",
            VerbosityLevel::Debug => "debug",
            VerbosityLevel::Trace => "trace",
        }
    }
}

/// Application context with resolved configuration and runtime state
pub struct AppContext {
    /// Resolved configuration
    pub config: Config,
    /// Where the configuration was (or would be) read from
    pub config_path: PathBuf,
    pub verbosity: VerbosityLevel,
    /// Console output
    pub out: Box<dyn OutputFormatter>,
}

impl AppContext {
    /// Build context with precedence: defaults > config file > env vars > CLI flags
    pub fn build(
        config_path: Option<PathBuf>,
        color: ColorChoice,
        verbosity: VerbosityLevel,
    ) -> Result<Self, String> {
        let config_path = config_path.unwrap_or_else(config::get_config_path);
        let config = config::load_config(&config_path)?;

        Ok(Self {
            config,
            config_path,
            verbosity,
            out: format::create_formatter(color),
        })
    }

    /// Registry over all configured repositories
    pub fn registry(&self) -> Result<Registry, String> {
        Registry::new(self.config.clone()).map_err(|e| e.to_string())
    }
}
