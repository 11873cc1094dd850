//! CLI command definitions and handlers

pub mod config;
pub mod handlers;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use output::OutputFormat;

/// scms - build a static site from a tree of HTML sources
#[derive(Parser, Debug)]
#[command(name = "scms", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: <config dir>/scms/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render every page of a source tree into a target directory
    Build(BuildArgs),

    /// Ingest and resolve a source tree without writing, reporting problems
    Check(CheckArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `build` command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Source directory holding the HTML documents
    #[arg(short = 'S', long, value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// Target directory for the generated site
    #[arg(short = 'T', long, value_name = "DIR")]
    pub target: Option<PathBuf>,

    /// Copyright holder shown in every page footer
    #[arg(short = 'C', long, value_name = "HOLDER")]
    pub copyright: Option<String>,

    /// Stylesheet URL linked from every page
    #[arg(long, value_name = "URL")]
    pub stylesheet: Option<String>,

    /// Script URL loaded by every page
    #[arg(long, value_name = "URL")]
    pub script: Option<String>,

    /// Directory levels whose HTML files are pages (deeper ones are copied)
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `check` command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Source directory holding the HTML documents
    #[arg(short = 'S', long, value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// Directory levels whose HTML files are pages
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `completions` command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (bash, zsh, fish)
    #[arg(value_enum)]
    pub shell: Shell,
}
