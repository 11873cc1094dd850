//! Page model, ingestion, hierarchy and link resolution.

mod hierarchy;
mod page;
mod references;
mod repository;

use std::path::Path;

pub use hierarchy::{PageKey, Site};
pub use page::{NOTE_SCHEME, PAGE_SCHEME, Page, PageError, REF_SCHEME, normalize_title};
pub use references::{LinkTargets, replace_page_references};
pub use repository::{Repository, RepositoryBuilder, SourceError, load_page};

use crate::infra::FsError;

/// Ingests `root`, assembles the hierarchy and resolves page links.
///
/// The result is ready for rendering.
///
/// # Errors
///
/// Returns an error only when the source root cannot be walked.
pub fn load_site(root: &Path, max_depth: usize, exclude: Option<&Path>) -> Result<Site, FsError> {
    let mut builder = RepositoryBuilder::new(root).max_depth(max_depth);
    if let Some(exclude) = exclude {
        builder = builder.exclude(exclude);
    }
    let mut site = Site::assemble(builder.build()?);
    site.resolve_links();
    Ok(site)
}
