mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config } => commands::serve(config).await,
        Command::Resweep { kind } => commands::resweep(cli.server, kind).await,
        Command::Status => commands::status(cli.server).await,
        Command::ScheduleFor { host_uuid, tenant } => {
            commands::schedule_for(cli.server, host_uuid, tenant).await
        }
    }
}
