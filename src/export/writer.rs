//! Writes rendered pages and copied assets into the target directory.

use std::path::Path;

use serde::Serialize;

use crate::dom::to_html;
use crate::domain::{Diagnostic, RunSummary};
use crate::infra::{FsError, copy_file, prepare_target, write_atomic};
use crate::site::{PageKey, Site};

use super::render::{RenderContext, render_page};

const INDEX_FILENAME: &str = "index.html";

/// Result of writing a site.
#[derive(Debug, Default, Serialize)]
pub struct BuildReport {
    /// Pages written under their dynamic filename.
    pub pages_written: usize,
    /// `{id}.html` copies written.
    pub permalinks_written: usize,
    /// Dynamic filename of the page also written as `index.html`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    pub assets_copied: usize,
    /// Pages or assets that could not be written.
    pub skipped: usize,
    /// Everything reported from ingestion to the last write.
    pub diagnostics: RunSummary,
}

/// Renders every page of `site` into `target` and copies its assets.
///
/// Primary pages are written first, then duplicates, both in id order. A
/// page the site marked as a filename collision loses its dynamic filename
/// but keeps its permalink. Per-file failures are logged and recorded; the
/// run continues.
///
/// # Errors
///
/// Returns an error when the target exists but is not a writable directory,
/// or cannot be created.
pub fn write_site(site: &Site, target: &Path, ctx: &RenderContext) -> Result<BuildReport, FsError> {
    prepare_target(target)?;

    let mut writer = Writer {
        target,
        report: BuildReport::default(),
    };
    writer
        .report
        .diagnostics
        .extend(site.diagnostics().iter().cloned());

    for key in site.keys() {
        writer.write_page(site, key, ctx);
    }
    for asset in site.assets() {
        writer.copy_asset(site.source_root(), asset);
    }

    log::info!(
        "wrote {} pages, {} permalinks and {} assets to {}",
        writer.report.pages_written,
        writer.report.permalinks_written,
        writer.report.assets_copied,
        target.display()
    );
    Ok(writer.report)
}

struct Writer<'a> {
    target: &'a Path,
    report: BuildReport,
}

impl Writer<'_> {
    fn write_page(&mut self, site: &Site, key: PageKey, ctx: &RenderContext) {
        let page = site.page(key);
        let name = site.dynamic_filename(key).trim_start_matches("./");
        let html = to_html(&render_page(site, key, ctx));

        if site.filename_collides(key) {
            log::debug!("{page}: {name} belongs to an earlier page, not written");
            self.report.skipped += 1;
        } else if self.write(name, &html, page.relative_path()) {
            log::info!("wrote {page} to {name}");
            self.report.pages_written += 1;
            if site.is_index(key) && self.write(INDEX_FILENAME, &html, page.relative_path()) {
                self.report.index = Some(name.to_string());
            }
        } else {
            self.report.skipped += 1;
        }

        if !site.is_duplicate(key) {
            let permalink = format!("{}.html", page.id());
            if self.write(&permalink, &html, page.relative_path()) {
                self.report.permalinks_written += 1;
            }
        }
    }

    fn write(&mut self, name: &str, html: &str, source: &Path) -> bool {
        match write_atomic(&self.target.join(name), html.as_bytes()) {
            Ok(()) => true,
            Err(err) => {
                log::error!("cannot write {name}: {err}");
                self.report
                    .diagnostics
                    .add(Diagnostic::io(source, err.to_string()));
                false
            }
        }
    }

    fn copy_asset(&mut self, source_root: &Path, asset: &Path) {
        let relative = asset.strip_prefix(source_root).unwrap_or(asset);
        match copy_file(asset, &self.target.join(relative)) {
            Ok(()) => {
                log::debug!("copied {}", relative.display());
                self.report.assets_copied += 1;
            }
            Err(err) => {
                log::error!("cannot copy {}: {err}", relative.display());
                self.report.skipped += 1;
                self.report
                    .diagnostics
                    .add(Diagnostic::io(relative, err.to_string()));
            }
        }
    }
}
