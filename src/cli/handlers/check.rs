//! Check command handler.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::cli::CheckArgs;
use crate::cli::config::Config;
use crate::cli::output::{CheckListing, Output, OutputFormat, print_diagnostics};
use crate::domain::RunSummary;
use crate::site::load_site;

pub fn handle_check(args: &CheckArgs, config: &Config) -> Result<()> {
    let source = config.source_dir(args.source_root.as_ref());
    let max_depth = config.max_depth(args.max_depth);
    let (pages, summary) = check_site(&source, max_depth)?;

    match args.format {
        OutputFormat::Human => {
            if summary.is_ok() {
                println!("All {pages} pages OK.");
                return Ok(());
            }
            print_diagnostics(&summary);
        }
        OutputFormat::Json => {
            let output = Output::new(CheckListing {
                pages,
                errors: summary.error_count(),
                warnings: summary.warning_count(),
                diagnostics: &summary,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    // Exit code: fail only if there are errors
    if summary.has_errors() {
        bail!("check failed");
    }
    Ok(())
}

/// Loads and resolves the site, returning the page count and diagnostics.
fn check_site(source: &Path, max_depth: usize) -> Result<(usize, RunSummary)> {
    let site = load_site(source, max_depth, None)
        .with_context(|| format!("cannot read source root {}", source.display()))?;
    let mut summary = RunSummary::new();
    summary.extend(site.diagnostics().iter().cloned());
    Ok((site.len(), summary))
}
