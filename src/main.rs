mod archive;
mod cli;
mod config;
mod ingest;
mod resource;
mod search;
mod utils;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload(args) => ingest::run(args, &cli.global)?,
        Commands::Search(args) => search::run(args, &cli.global)?,
        Commands::Resource(args) => resource::run(args, &cli.global)?,
        Commands::Item(args) => resource::run_item(args, &cli.global)?,
        Commands::Config(args) => config::commands::run(args)?,
    }

    Ok(())
}
