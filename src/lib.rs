//! scms - a static site generator for hand-written HTML pages arranged in a
//! parent/child hierarchy

pub mod cli;
pub mod dom;
pub mod domain;
pub mod export;
pub mod infra;
pub mod site;

use anyhow::Result;
use clap::Parser;

use cli::{
    Cli, Command,
    config::Config,
    handlers::{handle_build, handle_check, handle_completions},
};

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Build(args) => handle_build(args, &config),
        Command::Check(args) => handle_check(args, &config),
        Command::Completions(args) => {
            handle_completions(args.shell);
            Ok(())
        }
    }
}

/// `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}
