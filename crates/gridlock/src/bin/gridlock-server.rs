//! Coordinator entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use gridlock::prelude::*;

/// Run a Gridlock arbiter until SIGINT/SIGTERM or quorum loss.
#[derive(Parser)]
#[command(name = "gridlock-server", about = "Turn-based tic-tac-toe arbiter")]
struct Cli {
    /// Number of participants
    #[arg(long)]
    participants: Option<usize>,

    /// Fewest active participants before the server shuts down
    #[arg(long)]
    min_participants: Option<usize>,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the per-participant sockets
    #[arg(long)]
    runtime_dir: Option<PathBuf>,

    /// Score file
    #[arg(long)]
    scores: Option<PathBuf>,

    /// Event log file
    #[arg(long)]
    log: Option<PathBuf>,

    /// Pending event lines kept before the oldest is dropped
    #[arg(long)]
    log_capacity: Option<usize>,
}

impl Cli {
    fn server_config(self) -> Result<ServerConfig, GridlockError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_json_file(path)?,
            None => ServerConfig::default(),
        };
        if let Some(n) = self.participants {
            config.participants = n;
        }
        if let Some(m) = self.min_participants {
            config.min_participants = m;
        }
        if let Some(dir) = self.runtime_dir {
            config.runtime_dir = dir;
        }
        if let Some(path) = self.scores {
            config.scores_path = path;
        }
        if let Some(path) = self.log {
            config.log_path = path;
        }
        if let Some(k) = self.log_capacity {
            config.log_capacity = k;
        }
        Ok(config)
    }
}

async fn serve(cli: Cli) -> Result<ShutdownReport, GridlockError> {
    let config = cli.server_config()?;
    let server = GridlockServer::builder().config(config).build().await?;
    for path in server.socket_paths() {
        println!("Waiting for a client on {}", path.display());
    }
    server.run().await
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match serve(Cli::parse()).await {
        Ok(report) => {
            println!("Server stopped: {}", report.reason);
            for entry in report.scores.entries() {
                println!("{} {}", entry.name, entry.score);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "server failed to start");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
