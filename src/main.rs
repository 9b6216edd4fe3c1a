mod cli;
mod coordinator;
mod error;
mod logging;
mod lookup;
mod maps;
mod model;
#[cfg(feature = "tui")]
mod orchestrator;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = args.json || args.text;

    match cli::run(args).await {
        Ok(()) => {
            // Exit explicitly in one-shot modes so lingering connection-pool tasks don't hold the process.
            if is_non_tui {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}
