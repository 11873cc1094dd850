//! Diagnostics collected while building a site.
//!
//! Nothing in the pipeline aborts on a single bad document or link. Problems
//! are logged as they happen and also recorded here, so `check` and `build`
//! can report them afterwards.

use std::path::PathBuf;

use serde::Serialize;

use crate::domain::PageId;

/// A problem found while ingesting, resolving or writing a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The source (or output) file the problem belongs to.
    pub path: PathBuf,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(path: impl Into<PathBuf>, kind: DiagnosticKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// A document that could not be turned into a page.
    pub fn invalid(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(
            path,
            DiagnosticKind::Invalid {
                message: message.into(),
            },
        )
    }

    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(
            path,
            DiagnosticKind::Io {
                message: message.into(),
            },
        )
    }

    pub fn broken_link(path: impl Into<PathBuf>, target: PageId) -> Self {
        Self::new(path, DiagnosticKind::BrokenLink { target })
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.kind)
    }
}

/// The kind of problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Structurally invalid document, skipped.
    Invalid { message: String },

    /// Same id and same title as an already ingested page; dropped.
    DroppedDuplicate { id: PageId, kept: PathBuf },

    /// Same id as an already ingested page but a different title; kept as a
    /// duplicate page without permalink.
    DuplicateId { id: PageId, first_path: PathBuf },

    /// The parent id does not name a known page; placed at the root.
    DanglingParent { parent: PageId },

    /// Attaching to the parent would close a cycle; placed at the root.
    ParentCycle { parent: PageId },

    /// Another page in the same scope already holds the index claim.
    IndexClaimCleared,

    /// A `page:` link that resolved to neither a page nor a content anchor.
    BrokenLink { target: PageId },

    /// Another page already produced this output filename.
    FilenameCollision { filename: String },

    /// Reading, writing or copying a file failed.
    Io { message: String },
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::Invalid { .. } => Severity::Error,
            DiagnosticKind::DroppedDuplicate { .. } => Severity::Warning,
            DiagnosticKind::DuplicateId { .. } => Severity::Error,
            DiagnosticKind::DanglingParent { .. } => Severity::Warning,
            DiagnosticKind::ParentCycle { .. } => Severity::Warning,
            DiagnosticKind::IndexClaimCleared => Severity::Warning,
            DiagnosticKind::BrokenLink { .. } => Severity::Warning,
            DiagnosticKind::FilenameCollision { .. } => Severity::Error,
            DiagnosticKind::Io { .. } => Severity::Error,
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::Invalid { message } => write!(f, "invalid document: {message}"),
            DiagnosticKind::DroppedDuplicate { id, kept } => write!(
                f,
                "dropped duplicate of '{}' (kept {})",
                id.prefix(),
                kept.display()
            ),
            DiagnosticKind::DuplicateId { id, first_path } => write!(
                f,
                "duplicate ID '{}' (first seen in {})",
                id.prefix(),
                first_path.display()
            ),
            DiagnosticKind::DanglingParent { parent } => {
                write!(f, "unknown parent '{}', attached to root", parent.prefix())
            }
            DiagnosticKind::ParentCycle { parent } => {
                write!(f, "parent '{}' forms a cycle, attached to root", parent.prefix())
            }
            DiagnosticKind::IndexClaimCleared => write!(f, "index claim cleared"),
            DiagnosticKind::BrokenLink { target } => {
                write!(f, "broken link to '{}'", target)
            }
            DiagnosticKind::FilenameCollision { filename } => {
                write!(f, "output filename collision on {filename}")
            }
            DiagnosticKind::Io { message } => write!(f, "I/O error: {message}"),
        }
    }
}

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Every diagnostic of one run, in the order they were found.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub diagnostics: Vec<Diagnostic>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn total(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
            .count()
    }

    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Returns diagnostics ordered by severity, errors first.
    pub fn by_severity(&self) -> impl Iterator<Item = &Diagnostic> {
        let mut sorted: Vec<_> = self.diagnostics.iter().collect();
        sorted.sort_by_key(|d| std::cmp::Reverse(d.severity()));
        sorted.into_iter()
    }
}
