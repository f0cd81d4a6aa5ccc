//! Ultimate tic-tac-toe - unified CLI
//!
//! Local play, machine opponents, and online sessions over a store server.

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use ultimate_ttt::app;
use ultimate_ttt::cli::{Cli, Command};
use ultimate_ttt::store::server;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port } => server::serve(&host, port).await,
        Command::Play {
            difficulty,
            side,
            timer,
        } => {
            app::run_local(
                difficulty.map(Into::into),
                side.into(),
                timer.map(Into::into),
            )
            .await
        }
        Command::Host { server_url, timer } => {
            app::run_host(&server_url, timer.map(Into::into)).await
        }
        Command::Join { server_url, code } => app::run_join(&server_url, &code).await,
    }
}
