//! Command-line interface.

pub mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};

use crate::domain::errors::DomainError;
use crate::domain::models::RunMode;
use crate::infrastructure::ConfigError;

/// Ledger-gated iterative agent loop.
///
/// Repeatedly invokes the configured coding agent against the first pending
/// entry of the task ledger, feeding it fresh test and lint results each
/// cycle, until the ledger drains, the agent reports completion, or the
/// iteration budget is spent.
#[derive(Parser, Debug, Clone)]
#[command(name = "ostinato", version, about)]
pub struct Cli {
    /// Maximum number of agent iterations to run (at least 1)
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub budget: u32,

    /// Agent workflow mode
    #[arg(long, value_enum, default_value = "implement")]
    pub mode: Mode,

    /// Load configuration from this file instead of the .ostinato hierarchy
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Use the scripted mock agent instead of spawning the real agent CLI
    #[arg(long)]
    pub dry_run: bool,

    /// Emit progress as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// CLI-side workflow mode, converted into the domain enum.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Observe-only discovery: record new ledger entries, never edit code
    Discover,
    /// Edit code for exactly one current task per iteration and commit
    Implement,
}

impl From<Mode> for RunMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Discover => Self::Discover,
            Mode::Implement => Self::Implement,
        }
    }
}

/// Print a fatal-error diagnostic and exit non-zero.
pub fn handle_error(err: &anyhow::Error, json: bool) -> ! {
    let kind = if let Some(domain) = err.downcast_ref::<DomainError>() {
        domain.kind()
    } else if err.downcast_ref::<ConfigError>().is_some() {
        "config"
    } else {
        "runtime"
    };

    if json {
        let line = serde_json::json!({
            "event": "stopped",
            "cause": "fatal",
            "kind": kind,
            "error": format!("{err:#}"),
        });
        println!("{line}");
    } else {
        eprintln!("stopped: fatal error ({kind})");
        eprintln!("  {err:#}");
    }
    process::exit(1);
}
