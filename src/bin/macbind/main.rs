//! macbind CLI - bind Go packages into a static macOS framework

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("macbind=debug")
    } else if cli.quiet {
        EnvFilter::new("macbind=warn")
    } else {
        EnvFilter::new("macbind=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Bind(args) => commands::bind::execute(args, cli.verbose, cli.quiet),
        Commands::Doctor(args) => commands::doctor::execute(args, cli.verbose),
        Commands::Completions(args) => commands::completions::execute(args).map(|()| 0),
    }
}
