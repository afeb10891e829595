//! Edit engines
//!
//! All mutation goes through two phases: validation builds a
//! `PendingEdit` against clones, and `commit` splices the document.
//! Multi-line box edits validate every participating line first and
//! commit the whole batch only if all of them accepted, giving
//! all-or-nothing semantics without rollback logic.

pub mod annotation;
pub mod content;
pub mod context;
pub mod error;
pub mod tab;

pub use context::{
    CursorPosition, CursorTarget, DeleteScope, EditContext, EditDirection, PendingEdit,
};
pub use error::{EditError, TabParseError};

use crate::format::Formatter;
use crate::models::line::Document;

/// Commit a batch of validated single-line edits.
///
/// Every pending edit must replace exactly the lines it covers with
/// the same number of lines (true for all box edits), so earlier
/// commits never shift the indices of later ones.
pub fn commit_all(
    doc: &mut Document,
    pendings: Vec<PendingEdit>,
    fmt: &dyn Formatter,
) -> Result<Vec<CursorPosition>, EditError> {
    for pending in &pendings {
        if pending.replacement.len() != pending.last - pending.first {
            return Err(EditError::Internal);
        }
    }
    pendings
        .into_iter()
        .map(|pending| pending.commit(doc, fmt))
        .collect()
}
