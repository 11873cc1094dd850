//! Build command handler.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::cli::BuildArgs;
use crate::cli::config::Config;
use crate::cli::output::{Output, OutputFormat, print_diagnostics};
use crate::export::{BuildReport, RenderContext, RenderOptions, write_site};
use crate::site::load_site;

pub fn handle_build(args: &BuildArgs, config: &Config) -> Result<()> {
    let source = config.source_dir(args.source_root.as_ref());
    let target = config.target_dir(args.target.as_ref())?;
    let options = RenderOptions {
        stylesheet: config.stylesheet(args.stylesheet.as_deref()),
        script: config.script(args.script.as_deref()),
        copyright: config.copyright(args.copyright.as_deref()),
    };
    let max_depth = config.max_depth(args.max_depth);

    let report = build_site(&source, &target, max_depth, &options)?;

    match args.format {
        OutputFormat::Human => {
            println!(
                "Wrote {} page(s), {} permalink(s) and {} asset(s) to {}",
                report.pages_written,
                report.permalinks_written,
                report.assets_copied,
                target.display()
            );
            if let Some(index) = &report.index {
                println!("Index: {index}");
            }
            if !report.diagnostics.is_ok() {
                print_diagnostics(&report.diagnostics);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&Output::new(&report))?);
        }
    }
    Ok(())
}

/// Runs the whole pipeline from source tree to written target.
pub fn build_site(
    source: &Path,
    target: &Path,
    max_depth: usize,
    options: &RenderOptions,
) -> Result<BuildReport> {
    let source = absolute(source)?;
    let target = absolute(target)?;
    // never ingest our own output
    let exclude = target.starts_with(&source).then_some(target.as_path());

    let site = load_site(&source, max_depth, exclude)
        .with_context(|| format!("cannot read source root {}", source.display()))?;
    let ctx = RenderContext::new(&site, options, Utc::now());
    let report = write_site(&site, &target, &ctx)
        .with_context(|| format!("cannot write to target {}", target.display()))?;
    Ok(report)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("invalid path {}", path.display()))
}
