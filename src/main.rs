//! Diamond CLI entry point.
//!
//! Provides `selector`, `interface` and `simulate` subcommands for computing
//! dispatch keys and dry-running upgrade plans.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use diamond::config::{default_plan_path, load_plan};
use diamond::logging;
use diamond::simulate::simulate;
use diamond::types::{InterfaceId, Selector};

/// Selector-routing proxy tooling.
#[derive(Parser)]
#[command(name = "diamond", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Print the selector of each canonical function signature.
    Selector {
        /// Signatures such as `transferOwnership(address)`.
        #[arg(required = true)]
        signatures: Vec<String>,
    },
    /// Print the ERC-165 interface id of a set of signatures.
    Interface {
        /// Every function signature of the interface.
        #[arg(required = true)]
        signatures: Vec<String>,
    },
    /// Dry-run an upgrade plan and print a JSON report.
    Simulate {
        /// Path to the plan TOML file; defaults to `~/.diamond/plan.toml`.
        plan: Option<PathBuf>,
        /// Also write JSON logs to this directory.
        #[arg(long)]
        log_dir: Option<PathBuf>,
        /// Print compact instead of pretty JSON.
        #[arg(long)]
        compact: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Selector { signatures } => handle_selector(&signatures),
        Command::Interface { signatures } => handle_interface(&signatures),
        Command::Simulate {
            plan,
            log_dir,
            compact,
        } => {
            let plan = match plan {
                Some(path) => path,
                None => default_plan_path()?,
            };
            handle_simulate(&plan, log_dir, compact)
        }
    }
}

/// Print `selector  signature` per line.
fn handle_selector(signatures: &[String]) -> anyhow::Result<()> {
    logging::init_cli("warn");
    for signature in signatures {
        let selector = Selector::from_signature(signature)?;
        println!("{selector}  {signature}");
    }
    Ok(())
}

/// Print the XOR of all selectors.
fn handle_interface(signatures: &[String]) -> anyhow::Result<()> {
    logging::init_cli("warn");
    let id = InterfaceId::from_signatures(signatures)?;
    println!("{id}");
    Ok(())
}

/// Load, simulate and report a plan.
fn handle_simulate(path: &Path, log_dir: Option<PathBuf>, compact: bool) -> anyhow::Result<()> {
    let plan = load_plan(path)?;

    let _logging_guard = match log_dir {
        Some(dir) => Some(logging::init_production(&dir, &plan.logging.level)?),
        None => {
            logging::init_cli(&plan.logging.level);
            None
        }
    };
    debug!(plan = %path.display(), steps = plan.steps.len(), "simulating plan");

    let report = simulate(&plan).with_context(|| format!("failed to simulate {}", path.display()))?;
    let json = if compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{json}");
    Ok(())
}
