//! Tablature edit operations
//!
//! Tab lines are edited by (display column, string) pairs. The derived
//! geometry maps display columns back to edit-space column indices;
//! bar-line columns are derived, not stored, and refuse edits. Box
//! edits spanning several tab lines validate every line before any of
//! them commits.

use super::context::{CursorTarget, PendingEdit};
use super::error::EditError;
use crate::models::line::{Document, Line};
use crate::models::offset::RenderBounds;
use crate::models::tabline::{TabGeometry, TabLine};

fn tab_line(doc: &Document, line: usize) -> Result<TabLine, EditError> {
    match doc.line(line).ok_or(EditError::InvalidPosition)? {
        Line::Tab(tab) => Ok(tab.clone()),
        _ => Err(EditError::InvalidPosition),
    }
}

/// Map a display column to an edit-space column index, extending past
/// the current end when the column lies beyond the rendered width.
fn column_index(tab: &TabLine, geo: &TabGeometry, col: usize) -> Result<usize, EditError> {
    if geo.bar_positions.contains(&col) {
        return Err(EditError::BarLine);
    }
    if col < geo.label_width {
        return Err(EditError::InvalidPosition);
    }
    if let Some(i) = geo.index_bounds.iter().position(|b| b.contains(col)) {
        return Ok(i);
    }
    if col >= geo.width {
        return Ok(tab.columns.len() + (col - geo.width));
    }
    Err(EditError::InvalidPosition)
}

/// Type a fret digit at (display column, string). Typing onto an
/// existing single-digit fret carries into a two-digit fret.
pub fn set_note(
    doc: &Document,
    line: usize,
    col: usize,
    string: usize,
    digit: u8,
) -> Result<PendingEdit, EditError> {
    let mut tab = tab_line(doc, line)?;
    let geo = tab.geometry().clone();
    let index = column_index(&tab, &geo, col)?;

    if !tab.set_note(index, string, digit) {
        return Err(EditError::InvalidPosition);
    }
    let cursor = cursor_after_column(&mut tab, line, index);
    Ok(PendingEdit::replace_line(line, Line::Tab(tab), cursor))
}

/// Clear the fret at (display column, string). A tab line that empties
/// out converts back to an empty line.
pub fn clear_note(
    doc: &Document,
    line: usize,
    col: usize,
    string: usize,
) -> Result<PendingEdit, EditError> {
    let mut tab = tab_line(doc, line)?;
    let geo = tab.geometry().clone();
    let index = column_index(&tab, &geo, col)?;

    if !tab.clear_note(index, string) {
        return Err(EditError::NoComponent);
    }
    finish(line, tab, col)
}

/// Remove every column the selection touches, on all strings at once.
/// Selections covering a bar line are refused.
pub fn delete_columns(
    doc: &Document,
    line: usize,
    sel: RenderBounds,
) -> Result<PendingEdit, EditError> {
    let mut tab = tab_line(doc, line)?;
    let geo = tab.geometry().clone();

    if geo.bar_positions.iter().any(|b| sel.contains(*b)) {
        return Err(EditError::BarLine);
    }
    let hit: Vec<usize> = geo
        .index_bounds
        .iter()
        .enumerate()
        .filter(|(_, b)| b.intersects(&sel))
        .map(|(i, _)| i)
        .collect();
    let (Some(first), Some(last)) = (hit.first(), hit.last()) else {
        return Err(EditError::NoComponent);
    };

    tab.delete_columns(*first, last + 1);
    finish(line, tab, sel.start)
}

/// Validate the same column deletion across several parallel tab
/// lines. All lines must accept before any of them commits; commit the
/// returned batch with `edit::commit_all`.
pub fn box_delete(
    doc: &Document,
    lines: &[usize],
    sel: RenderBounds,
) -> Result<Vec<PendingEdit>, EditError> {
    lines
        .iter()
        .map(|&line| delete_columns(doc, line, sel))
        .collect()
}

/// Replace an empty line with an aligned tablature grid.
pub fn convert_empty_to_tab(
    doc: &Document,
    line: usize,
    tab: TabLine,
) -> Result<PendingEdit, EditError> {
    match doc.line(line).ok_or(EditError::InvalidPosition)? {
        Line::Empty => {}
        _ => return Err(EditError::InvalidPosition),
    }
    let mut tab = tab;
    let col = tab.geometry().label_width + 1;
    Ok(PendingEdit::replace_line(
        line,
        Line::Tab(tab),
        CursorTarget::Column { line, col },
    ))
}

fn cursor_after_column(tab: &mut TabLine, line: usize, index: usize) -> CursorTarget {
    let geo = tab.geometry();
    let col = geo
        .index_bounds
        .get(index)
        .map(|b| b.after)
        .unwrap_or(geo.width);
    CursorTarget::Column { line, col }
}

fn finish(line: usize, tab: TabLine, col: usize) -> Result<PendingEdit, EditError> {
    let replacement = if tab.is_blank() {
        Line::Empty
    } else {
        Line::Tab(tab)
    };
    Ok(PendingEdit::replace_line(
        line,
        replacement,
        CursorTarget::Column { line, col },
    ))
}
