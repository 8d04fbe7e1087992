// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use melpazoid::Config;

fn main() -> Result<()> {
    // Logs go to stderr so the report on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    if config.no_color {
        colored::control::set_override(false);
    }

    let command = cli
        .command
        .unwrap_or_else(|| Commands::from_lookup(|key| std::env::var(key).ok()));
    let session = commands::Session::new(config, !cli.no_build)?;
    let code = commands::run(command, &session)?;
    std::process::exit(code);
}
