//! cmdsec: command authorization compliance checks
//!
//! ## Commands
//!
//! - **check**: fail when a module has commands that neither declare, inherit
//!   nor delegate authorization
//! - **print**: render the module's command catalogue (summary, wiki, csv, json)
//!
//! ## Example Usage
//!
//! ```bash
//! # Check a module against its dependencies
//! cmdsec check --classpath target/classes --classpath ../config-api/target/classes
//!
//! # Only warn, with the per-class trace
//! cmdsec -v check --classpath target/classes --no-fail --trace
//!
//! # Produce a CSV catalogue
//! cmdsec print --classpath target/classes --format csv --output commandList.txt
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod cmdsec_cli;

use cmdsec_cli::{check::CheckCmd, print::PrintCmd};

#[derive(Parser)]
#[command(
    name = "cmdsec",
    author,
    version,
    about = "Command authorization compliance checks",
    long_about = "Verifies that every administrative command in a module declares, inherits \
                  or delegates its authorization, and lists what each command requires."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (debug logging, trace lines)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a module for commands without authorization
    Check(CheckCmd),

    /// Print the authorization catalogue of a module
    Print(PrintCmd),
}

fn main() -> Result<()> {
    let Cli {
        command,
        json,
        verbose,
    } = Cli::parse();

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();

    match command {
        Commands::Check(cmd) => cmd.execute(json, verbose),
        Commands::Print(cmd) => cmd.execute(json),
    }
}
