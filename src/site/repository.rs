//! Ingestion of a source tree into id-keyed page collections.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::dom::parse_html;
use crate::domain::{Diagnostic, DiagnosticKind, PageId};
use crate::infra::{DEFAULT_MAX_DEPTH, FsError, file_times, read_source, scan_source_tree};

use super::page::{Page, PageError};

// ===========================================
// SourceError Type
// ===========================================

/// Why a single source file was skipped.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Page(#[from] PageError),
}

impl SourceError {
    fn to_diagnostic(&self, path: &Path) -> Diagnostic {
        match self {
            SourceError::Fs(err) => Diagnostic::io(path, err.to_string()),
            SourceError::Page(err) => Diagnostic::invalid(path, err.to_string()),
        }
    }
}

/// Reads, parses and extracts one source document.
pub fn load_page(path: &Path, root: &Path) -> Result<Page, SourceError> {
    let text = read_source(path)?;
    let doc = parse_html(&text);
    let times = file_times(path);
    Ok(Page::from_source(doc, path, root, times)?)
}

// ===========================================
// Repository
// ===========================================

/// Every page of a source tree, split by identity.
///
/// `primary` holds one page per id; `duplicates` holds pages that share an
/// id with a primary page but not its title. Both are ordered by id.
#[derive(Debug)]
pub struct Repository {
    root: PathBuf,
    primary: BTreeMap<PageId, Page>,
    duplicates: BTreeMap<PageId, Page>,
    assets: Vec<PathBuf>,
    diagnostics: Vec<Diagnostic>,
}

impl Repository {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            primary: BTreeMap::new(),
            duplicates: BTreeMap::new(),
            assets: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn primary(&self) -> &BTreeMap<PageId, Page> {
        &self.primary
    }

    pub fn duplicates(&self) -> &BTreeMap<PageId, Page> {
        &self.duplicates
    }

    /// Non-document files, absolute, in walk order.
    pub fn assets(&self) -> &[PathBuf] {
        &self.assets
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.duplicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn into_parts(self) -> RepositoryParts {
        RepositoryParts {
            root: self.root,
            primary: self.primary,
            duplicates: self.duplicates,
            assets: self.assets,
            diagnostics: self.diagnostics,
        }
    }

    /// Files a freshly loaded page under its id.
    ///
    /// A known id is resolved in this order: an index page displaces a
    /// non-index primary, which becomes the duplicate; a case-insensitively
    /// equal title drops the newcomer; anything else keeps the newcomer as a
    /// duplicate. Duplicates never hold an index claim.
    pub(crate) fn admit(&mut self, mut page: Page) {
        let id = page.id();
        let Some(existing) = self.primary.get(&id) else {
            self.primary.insert(id, page);
            return;
        };

        if page.index_claim() && !existing.index_claim() {
            let first_path = page.relative_path().to_path_buf();
            let Some(mut demoted) = self.primary.insert(id, page) else {
                return;
            };
            log::error!(
                "duplicate ID {id}: index {} replaces {}",
                first_path.display(),
                demoted.relative_path().display()
            );
            demoted.mark_duplicate();
            self.diagnostics.push(Diagnostic::new(
                demoted.relative_path(),
                DiagnosticKind::DuplicateId { id, first_path },
            ));
            self.insert_duplicate(demoted);
            return;
        }

        let kept = existing.relative_path().to_path_buf();
        page.clear_index();
        if page.title().to_lowercase() == existing.title().to_lowercase() {
            log::warn!(
                "dropping {}: same ID and title as {}",
                page.relative_path().display(),
                kept.display()
            );
            self.diagnostics.push(Diagnostic::new(
                page.relative_path(),
                DiagnosticKind::DroppedDuplicate { id, kept },
            ));
            return;
        }

        log::error!(
            "duplicate ID {id}: {} keeps the permalink, {} is rendered as duplicate",
            kept.display(),
            page.relative_path().display()
        );
        page.mark_duplicate();
        self.diagnostics.push(Diagnostic::new(
            page.relative_path(),
            DiagnosticKind::DuplicateId {
                id,
                first_path: kept,
            },
        ));
        self.insert_duplicate(page);
    }

    fn insert_duplicate(&mut self, page: Page) {
        let path = page.relative_path().to_path_buf();
        if let Some(replaced) = self.duplicates.insert(page.id(), page) {
            log::warn!(
                "duplicate {} replaces earlier duplicate {}",
                path.display(),
                replaced.relative_path().display()
            );
        }
    }
}

/// A repository taken apart for hierarchy assembly.
pub(crate) struct RepositoryParts {
    pub root: PathBuf,
    pub primary: BTreeMap<PageId, Page>,
    pub duplicates: BTreeMap<PageId, Page>,
    pub assets: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

// ===========================================
// RepositoryBuilder
// ===========================================

/// Builder for loading a [`Repository`] from a source directory.
///
/// ```no_run
/// use scms::site::RepositoryBuilder;
///
/// let repo = RepositoryBuilder::new("site-src").max_depth(2).build()?;
/// println!("{} pages", repo.len());
/// # Ok::<(), scms::infra::FsError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RepositoryBuilder {
    root: PathBuf,
    max_depth: usize,
    exclude: Option<PathBuf>,
}

impl RepositoryBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            exclude: None,
        }
    }

    /// Directory levels whose HTML files are documents; deeper ones are assets.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// A directory below the root to leave out entirely, usually the target.
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclude = Some(path.into());
        self
    }

    /// Walks the root and ingests every document.
    ///
    /// Per-document failures are logged, recorded as diagnostics and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only when the root itself cannot be walked.
    pub fn build(self) -> Result<Repository, FsError> {
        let tree = scan_source_tree(&self.root, self.max_depth, self.exclude.as_deref())?;
        let mut repo = Repository::new(&self.root);
        repo.assets = tree.assets;

        let mut claimed_dirs: BTreeSet<PathBuf> = BTreeSet::new();
        for path in &tree.documents {
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let mut page = match load_page(path, &self.root) {
                Ok(page) => page,
                Err(err) => {
                    log::error!("skipping {}: {err}", relative.display());
                    repo.diagnostics.push(err.to_diagnostic(relative));
                    continue;
                }
            };
            log::debug!("loaded {page}");

            if page.index_claim() {
                let dir = relative.parent().unwrap_or(Path::new("")).to_path_buf();
                if !claimed_dirs.insert(dir) {
                    log::warn!(
                        "{}: another page in this directory already claims index",
                        relative.display()
                    );
                    page.clear_index();
                    repo.diagnostics
                        .push(Diagnostic::new(relative, DiagnosticKind::IndexClaimCleared));
                }
            }
            repo.admit(page);
        }

        log::info!(
            "ingested {} primary and {} duplicate pages, {} assets",
            repo.primary.len(),
            repo.duplicates.len(),
            repo.assets.len()
        );
        Ok(repo)
    }
}
