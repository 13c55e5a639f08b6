//! Terminal client for one participant.

use std::path::PathBuf;

use clap::Parser;
use gridlock::prelude::*;
use tokio::io::BufReader;

/// Play as one participant of a running Gridlock server.
#[derive(Parser)]
#[command(name = "gridlock-client", about = "Gridlock terminal client")]
struct Cli {
    /// Participant id, starting at 0
    id: u32,

    /// Directory holding the per-participant sockets
    #[arg(long, default_value = "/tmp/gridlock")]
    runtime_dir: PathBuf,
}

async fn play(cli: Cli) -> Result<ClientSummary, GridlockError> {
    let conn = UnixConnection::connect(socket_path(&cli.runtime_dir, cli.id)).await?;
    println!(
        "Connected as Player {}. Enter moves as 'row col' or 'quit' to exit.",
        cli.id
    );
    run_client(conn, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = match play(Cli::parse()).await {
        Ok(summary) => {
            tracing::debug!(
                sent = summary.lines_sent,
                received = summary.lines_received,
                "client finished"
            );
            0
        }
        Err(e) => {
            eprintln!("{e}");
            1
        }
    };
    // A pending stdin read sits on a blocking thread the runtime would wait for.
    std::process::exit(code);
}
