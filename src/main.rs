//! `hauler` - a thin command-line front end over `hauler-core`'s retrieval
//! session, for exercising a `Get` against a live indexer from a terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hauler_core::{Cid, Selector, Session, SessionOptions};
use std::str::FromStr;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hauler")]
#[command(about = "Content-addressed retrieval client")]
#[command(version)]
struct Cli {
    /// Indexer base URL to query for providers.
    #[arg(long, global = true)]
    indexer: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a CID and print the decoded root node.
    Get {
        /// The CID to fetch.
        cid: String,
        /// Fetch every block reachable from the root, not just the root.
        #[arg(long)]
        recursive: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Get { cid, recursive } => {
            let root = Cid::from_str(&cid).context("not a valid cid")?;
            let selector = if recursive {
                Selector::MatchAllRecursively
            } else {
                Selector::MatchRoot
            };

            let mut builder = SessionOptions::builder();
            if let Some(indexer) = cli.indexer {
                builder = builder.with_indexer(indexer);
            }
            let session = Session::new(builder.build()).context("failed to build session")?;

            let node = session
                .get(CancellationToken::new(), root, selector)
                .await
                .context("get failed")?;

            println!("{node:?}");
        }
    }

    Ok(())
}
