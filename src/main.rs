// follow-fellow command line.
// Sets up logging and hands over to the CLI driver.

use std::process::exit;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use follow_fellow::cli::Cli;

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_env("FELLOW_LOG")
        .unwrap_or_else(|_| EnvFilter::new("follow_fellow=info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = Cli::parse().run().await {
        error!("{error:#}");
        exit(1);
    }
}
