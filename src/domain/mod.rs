//! Core types: PageId (UUID) and run diagnostics

mod diagnostic;
mod page_id;

pub use diagnostic::{Diagnostic, DiagnosticKind, RunSummary, Severity};
pub use page_id::{PageId, ParseIdError};
