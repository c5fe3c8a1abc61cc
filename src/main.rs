use clap::Parser;
use tracing_subscriber::EnvFilter;

use trebuchet::pipeline::{self, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = pipeline::dispatch(&cli) {
        if let Some(step) = e.step() {
            tracing::error!("aborted at step '{step}'");
        }
        return Err(e.into());
    }
    Ok(())
}
