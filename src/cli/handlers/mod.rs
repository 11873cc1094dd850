//! Command handlers for the CLI.

mod build;
mod check;

use std::io;

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::Cli;

// Re-export public items
pub use build::{build_site, handle_build};
pub use check::handle_check;

/// Writes completions for `shell` to stdout.
pub fn handle_completions(shell: Shell) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    generate(shell, &mut command, name, &mut io::stdout());
}
