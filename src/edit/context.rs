//! Edit context and two-phase edit results
//!
//! Edits arrive from the UI as a selection range in display
//! coordinates plus a direction. The engines never mutate the document
//! while validating: a successful validation yields a `PendingEdit`
//! holding fully-built replacement lines and a *symbolic* cursor, and
//! only `commit` splices the document. The cursor is symbolic because
//! the display projection of the mutated line — and with it the
//! virtual/filler structure the cursor must navigate — exists only
//! after the rebuild.

use serde::{Deserialize, Serialize};

use crate::edit::error::EditError;
use crate::format::Formatter;
use crate::models::line::{Document, Line};
use crate::models::offset::{Bias, ContentOffset, RenderBounds};

/// Which way an empty-selection delete reaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditDirection {
    Forward,
    Backward,
}

/// How far an empty-selection delete widens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteScope {
    /// One display column, skipping virtual elements.
    Character,
    /// To the nearest component boundary.
    Word,
}

/// An edit request against one line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditContext {
    /// Index of the line in the document.
    pub line: usize,

    /// Selection in display columns; empty means a caret.
    pub selection: RenderBounds,

    pub direction: EditDirection,

    pub scope: DeleteScope,
}

impl EditContext {
    pub fn caret(line: usize, col: usize, direction: EditDirection) -> Self {
        EditContext {
            line,
            selection: RenderBounds::at(col),
            direction,
            scope: DeleteScope::Character,
        }
    }

    pub fn range(line: usize, start: usize, after: usize) -> Self {
        EditContext {
            line,
            selection: RenderBounds::new(start, after),
            direction: EditDirection::Backward,
            scope: DeleteScope::Character,
        }
    }
}

/// Concrete cursor handed back to the UI after a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub line: usize,
    pub col: usize,
}

/// Cursor described against the post-edit structure, resolved to a
/// display column only after the layout rebuild.
#[derive(Clone, Debug, PartialEq)]
pub enum CursorTarget {
    /// Column 0 of a line with no addressable content.
    LineStart { line: usize },

    /// A content offset within a component, with the virtual-boundary
    /// snap policy to apply.
    InComponent {
        line: usize,
        component: usize,
        offset: ContentOffset,
        bias: Bias,
    },

    /// An edge of the attachment anchored at `anchor` on `component`,
    /// in the annotation track.
    AttachmentEdge {
        line: usize,
        component: usize,
        anchor: ContentOffset,
        end: bool,
    },

    /// A raw display column, clamped to the rebuilt track width.
    Column { line: usize, col: usize },
}

impl CursorTarget {
    pub fn line(&self) -> usize {
        match self {
            CursorTarget::LineStart { line }
            | CursorTarget::InComponent { line, .. }
            | CursorTarget::AttachmentEdge { line, .. }
            | CursorTarget::Column { line, .. } => *line,
        }
    }
}

/// A validated edit, ready to commit.
///
/// Holds the fully-built replacement for document lines
/// `[first, last)`. Validation happens on clones; the document is
/// only touched here, once, which is what makes multi-line edits
/// all-or-nothing without rollback logic.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingEdit {
    pub first: usize,
    pub last: usize,
    pub replacement: Vec<Line>,
    pub cursor: CursorTarget,
}

impl PendingEdit {
    /// Replace one line in place.
    pub fn replace_line(line: usize, replacement: Line, cursor: CursorTarget) -> Self {
        PendingEdit {
            first: line,
            last: line + 1,
            replacement: vec![replacement],
            cursor,
        }
    }

    /// Apply the edit and resolve the cursor against the rebuilt
    /// display projection.
    pub fn commit(self, doc: &mut Document, fmt: &dyn Formatter) -> Result<CursorPosition, EditError> {
        doc.splice_lines(self.first, self.last, self.replacement);
        resolve_cursor(doc, &self.cursor, fmt)
    }
}

/// Resolve a symbolic cursor to a concrete display column.
pub fn resolve_cursor(
    doc: &mut Document,
    cursor: &CursorTarget,
    fmt: &dyn Formatter,
) -> Result<CursorPosition, EditError> {
    let line_idx = cursor.line();
    let line = doc.line_mut(line_idx).ok_or(EditError::Internal)?;

    let col = match cursor {
        CursorTarget::LineStart { .. } => 0,
        CursorTarget::Column { col, .. } => match line {
            Line::Content(content) => {
                let layout = content.layout(fmt);
                let annotation = layout.annotation.as_ref().map_or(0, |t| t.width);
                (*col).min(layout.width().max(annotation))
            }
            Line::Tab(tab) => (*col).min(tab.geometry().width),
            _ => *col,
        },
        CursorTarget::InComponent {
            component,
            offset,
            bias,
            ..
        } => {
            let content = line.as_content_mut().ok_or(EditError::Internal)?;
            let layout = content.layout(fmt);
            layout
                .display_offset(*component, *offset, *bias)
                .ok_or(EditError::Internal)?
        }
        CursorTarget::AttachmentEdge {
            component,
            anchor,
            end,
            ..
        } => {
            let content = line.as_content_mut().ok_or(EditError::Internal)?;
            let attachment = content
                .components
                .get(*component)
                .and_then(|c| c.attachment_at(*anchor))
                .ok_or(EditError::Internal)?;
            let layout = content.layout(fmt);
            let span = layout
                .attachment_span(*component, attachment)
                .ok_or(EditError::Internal)?;
            if *end {
                span.after
            } else {
                span.start
            }
        }
    };

    Ok(CursorPosition {
        line: line_idx,
        col,
    })
}
