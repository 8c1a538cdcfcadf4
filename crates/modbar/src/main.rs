// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand};
use modbar::{init_tracing, BarHost, Config, Module};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "modbar", version, about)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// No-op placeholder kept for CLI-convention parity with the host's
    /// sibling tools; this binary has no OAuth surface to configure.
    SetupOauth,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::SetupOauth)) {
        println!("modbar has no OAuth configuration; nothing to do.");
        return Ok(());
    }

    init_tracing(&cli.config);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(cli.config))
}

async fn run(config: Config) -> anyhow::Result<()> {
    let mut host = BarHost::new();
    host.suppress_signals(config.no_signals);
    if let (Some(stop), Some(cont)) = (config.stop_signal, config.cont_signal) {
        host.set_signals(stop, cont);
    }

    info!("starting modbar");
    let modules: Vec<Arc<dyn Module>> = Vec::new();
    host.run(modules).await?;
    Ok(())
}
