// Copyright 2026 Slotwatch Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use slotwatch::cli;

#[derive(Parser)]
#[command(
    name = "slotwatch",
    about = "Slotwatch — headless watcher for Prenot@Mi appointment-slot availability",
    version,
    after_help = "Run 'slotwatch <command> --help' for details on each command.\nRun 'slotwatch' with no command to start watching."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the polling watcher until stopped (SIGINT/SIGTERM)
    Watch,
    /// Run one poll cycle, print each target's status, and exit
    Check {
        /// Output readings as JSON (machine-readable)
        #[arg(long)]
        json: bool,
    },
    /// Open a visible browser to sign in and save the session profile
    Login,
    /// Check environment and diagnose issues
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "slotwatch=debug"
    } else {
        "slotwatch=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse().unwrap()),
        )
        .init();

    let result = match cli.command {
        // No subcommand → watch, the process's whole purpose
        None | Some(Commands::Watch) => cli::watch_cmd::run().await,
        Some(Commands::Check { json }) => cli::check_cmd::run(json).await,
        Some(Commands::Login) => cli::login_cmd::run().await,
        Some(Commands::Doctor) => cli::doctor::run().await,
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    result
}
