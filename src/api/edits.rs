//! JavaScript-facing edit API
//!
//! The WASM module owns the canonical document; the UI layer sends
//! selection ranges in display coordinates and re-renders the dirty
//! lines from each edit result.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use wasm_bindgen::prelude::*;

use super::helpers::{deserialize, edit_error, serialize, tab_error};
use crate::edit::annotation::AnnotationContext;
use crate::edit::context::{DeleteScope, EditContext, EditDirection, PendingEdit};
use crate::edit::{annotation, commit_all, content, tab};
use crate::format::SheetFormatter;
use crate::models::line::{Document, Line};
use crate::models::offset::RenderBounds;
use crate::parse::tab::align_strings;
use crate::renderers::tab_grid;
use crate::wasm_log;

// WASM-owned document storage (canonical source of truth)
lazy_static! {
    static ref DOCUMENT: Mutex<Option<Document>> = Mutex::new(None);
}

/// One re-rendered line in an edit result.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RenderedLine {
    pub row: usize,
    pub kind: String,
    pub content: String,
    pub annotation: Option<String>,
    pub tab_rows: Option<Vec<String>>,
}

/// Result of an edit operation (mutation primitive).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EditOutcome {
    pub dirty_lines: Vec<RenderedLine>,
    pub new_cursor_line: usize,
    pub new_cursor_col: usize,
}

fn with_document<T>(f: impl FnOnce(&mut Document) -> Result<T, JsValue>) -> Result<T, JsValue> {
    let mut guard = DOCUMENT
        .lock()
        .map_err(|_| JsValue::from_str("document lock poisoned"))?;
    let doc = guard
        .as_mut()
        .ok_or_else(|| JsValue::from_str("no document loaded"))?;
    f(doc)
}

fn render_row(doc: &mut Document, row: usize, fmt: &SheetFormatter) -> RenderedLine {
    match doc.line_mut(row) {
        Some(Line::Content(line)) => {
            let layout = line.layout(fmt);
            RenderedLine {
                row,
                kind: "content".into(),
                content: layout.content.text(),
                annotation: layout.annotation.as_ref().map(|t| t.text()),
                tab_rows: None,
            }
        }
        Some(Line::Title(title)) => RenderedLine {
            row,
            kind: "title".into(),
            content: format!("[{}]", title.label),
            annotation: None,
            tab_rows: None,
        },
        Some(Line::Tab(tabline)) => {
            let grid = tab_grid::render(tabline);
            RenderedLine {
                row,
                kind: "tab".into(),
                content: String::new(),
                annotation: None,
                tab_rows: Some(grid.rows),
            }
        }
        _ => RenderedLine {
            row,
            kind: "empty".into(),
            content: String::new(),
            annotation: None,
            tab_rows: None,
        },
    }
}

fn run_edit(
    doc: &mut Document,
    pending: PendingEdit,
    fmt: &SheetFormatter,
) -> Result<EditOutcome, JsValue> {
    let first = pending.first;
    let count = pending.replacement.len();
    let cursor = pending.commit(doc, fmt).map_err(edit_error)?;

    let dirty_lines = (first..first + count)
        .map(|row| render_row(doc, row, fmt))
        .collect();
    Ok(EditOutcome {
        dirty_lines,
        new_cursor_line: cursor.line,
        new_cursor_col: cursor.col,
    })
}

fn direction(forward: bool) -> EditDirection {
    if forward {
        EditDirection::Forward
    } else {
        EditDirection::Backward
    }
}

// ============================================================================
// Document lifecycle
// ============================================================================

/// Create a fresh document with a single empty line.
#[wasm_bindgen]
pub fn new_document() {
    let mut doc = Document::new();
    doc.lines.push(Line::Empty);
    *DOCUMENT.lock().expect("document lock poisoned") = Some(doc);
    wasm_log!("new document created");
}

/// Replace the document from a serialized value.
#[wasm_bindgen]
pub fn load_document(value: JsValue) -> Result<(), JsValue> {
    let doc: Document = deserialize(value, "document")?;
    *DOCUMENT
        .lock()
        .map_err(|_| JsValue::from_str("document lock poisoned"))? = Some(doc);
    Ok(())
}

/// The whole document as a JavaScript value.
#[wasm_bindgen]
pub fn get_document() -> Result<JsValue, JsValue> {
    with_document(|doc| serialize(doc, "document"))
}

/// Exact snapshot of content and attachment offsets.
#[wasm_bindgen]
pub fn snapshot_document() -> Result<String, JsValue> {
    with_document(|doc| {
        doc.snapshot()
            .map_err(|e| JsValue::from_str(&format!("snapshot failed: {}", e)))
    })
}

/// Restore a document from a snapshot.
#[wasm_bindgen]
pub fn restore_document(json: &str) -> Result<(), JsValue> {
    let doc = Document::restore(json)
        .map_err(|e| JsValue::from_str(&format!("restore failed: {}", e)))?;
    *DOCUMENT
        .lock()
        .map_err(|_| JsValue::from_str("document lock poisoned"))? = Some(doc);
    Ok(())
}

/// Render one line for display.
#[wasm_bindgen]
pub fn render_line(row: usize) -> Result<JsValue, JsValue> {
    let fmt = SheetFormatter::default();
    with_document(|doc| {
        if row >= doc.lines.len() {
            return Err(JsValue::from_str("row out of range"));
        }
        serialize(&render_row(doc, row, &fmt), "rendered line")
    })
}

// ============================================================================
// Content edits
// ============================================================================

/// Insert text over a display-coordinate selection.
#[wasm_bindgen]
pub fn insert_text(
    row: usize,
    sel_start: usize,
    sel_after: usize,
    text: &str,
) -> Result<JsValue, JsValue> {
    let fmt = SheetFormatter::default();
    let ctx = EditContext {
        line: row,
        selection: RenderBounds::new(sel_start.min(sel_after), sel_start.max(sel_after)),
        direction: EditDirection::Backward,
        scope: DeleteScope::Character,
    };
    with_document(|doc| {
        let pending = content::insert(doc, &ctx, text, &fmt).map_err(edit_error)?;
        serialize(&run_edit(doc, pending, &fmt)?, "edit outcome")
    })
}

/// Delete the selection, or one position in the given direction.
#[wasm_bindgen]
pub fn delete_selection(
    row: usize,
    sel_start: usize,
    sel_after: usize,
    forward: bool,
    whole_word: bool,
) -> Result<JsValue, JsValue> {
    let fmt = SheetFormatter::default();
    let ctx = EditContext {
        line: row,
        selection: RenderBounds::new(sel_start.min(sel_after), sel_start.max(sel_after)),
        direction: direction(forward),
        scope: if whole_word {
            DeleteScope::Word
        } else {
            DeleteScope::Character
        },
    };
    with_document(|doc| {
        let pending = content::delete(doc, &ctx, &fmt).map_err(edit_error)?;
        serialize(&run_edit(doc, pending, &fmt)?, "edit outcome")
    })
}

// ============================================================================
// Annotation edits
// ============================================================================

/// Insert into the annotation track: chord text anchors a new
/// attachment, whitespace at an attachment boundary moves it.
#[wasm_bindgen]
pub fn annotation_insert(row: usize, col: usize, text: &str) -> Result<JsValue, JsValue> {
    let fmt = SheetFormatter::default();
    let ctx = AnnotationContext {
        line: row,
        selection: RenderBounds::at(col),
        direction: EditDirection::Backward,
    };
    with_document(|doc| {
        let pending = annotation::insert(doc, &ctx, text, &fmt).map_err(edit_error)?;
        serialize(&run_edit(doc, pending, &fmt)?, "edit outcome")
    })
}

/// Delete within the annotation track.
#[wasm_bindgen]
pub fn annotation_delete(
    row: usize,
    sel_start: usize,
    sel_after: usize,
    forward: bool,
) -> Result<JsValue, JsValue> {
    let fmt = SheetFormatter::default();
    let ctx = AnnotationContext {
        line: row,
        selection: RenderBounds::new(sel_start.min(sel_after), sel_start.max(sel_after)),
        direction: direction(forward),
    };
    with_document(|doc| {
        let pending = annotation::delete(doc, &ctx, &fmt).map_err(edit_error)?;
        serialize(&run_edit(doc, pending, &fmt)?, "edit outcome")
    })
}

// ============================================================================
// Tablature edits
// ============================================================================

/// Type a fret digit at (row, display column, string).
#[wasm_bindgen]
pub fn tab_set_note(row: usize, col: usize, string: usize, digit: u8) -> Result<JsValue, JsValue> {
    let fmt = SheetFormatter::default();
    with_document(|doc| {
        let pending = tab::set_note(doc, row, col, string, digit).map_err(edit_error)?;
        serialize(&run_edit(doc, pending, &fmt)?, "edit outcome")
    })
}

/// Clear the fret at (row, display column, string).
#[wasm_bindgen]
pub fn tab_clear_note(row: usize, col: usize, string: usize) -> Result<JsValue, JsValue> {
    let fmt = SheetFormatter::default();
    with_document(|doc| {
        let pending = tab::clear_note(doc, row, col, string).map_err(edit_error)?;
        serialize(&run_edit(doc, pending, &fmt)?, "edit outcome")
    })
}

/// Delete the tab columns covered by a display-coordinate selection.
#[wasm_bindgen]
pub fn tab_delete_columns(row: usize, sel_start: usize, sel_after: usize) -> Result<JsValue, JsValue> {
    let fmt = SheetFormatter::default();
    with_document(|doc| {
        let pending = tab::delete_columns(doc, row, RenderBounds::new(sel_start, sel_after))
            .map_err(edit_error)?;
        serialize(&run_edit(doc, pending, &fmt)?, "edit outcome")
    })
}

/// Apply the same column deletion to several tab lines at once; every
/// line must accept before any of them commits.
#[wasm_bindgen]
pub fn tab_box_delete(rows: JsValue, sel_start: usize, sel_after: usize) -> Result<JsValue, JsValue> {
    let fmt = SheetFormatter::default();
    let rows: Vec<usize> = deserialize(rows, "box rows")?;
    with_document(|doc| {
        let pendings =
            tab::box_delete(doc, &rows, RenderBounds::new(sel_start, sel_after)).map_err(edit_error)?;
        let dirty_rows: Vec<usize> = pendings.iter().map(|p| p.first).collect();
        let cursors = commit_all(doc, pendings, &fmt).map_err(edit_error)?;

        let dirty_lines: Vec<RenderedLine> = dirty_rows
            .iter()
            .map(|&row| render_row(doc, row, &fmt))
            .collect();
        let cursor = cursors.last().copied();
        let outcome = EditOutcome {
            dirty_lines,
            new_cursor_line: cursor.map_or(0, |c| c.line),
            new_cursor_col: cursor.map_or(0, |c| c.col),
        };
        serialize(&outcome, "edit outcome")
    })
}

/// Align raw per-string tab input and place it on an empty line.
#[wasm_bindgen]
pub fn parse_tab_input(row: usize, strings: JsValue, tuning: JsValue) -> Result<JsValue, JsValue> {
    let fmt = SheetFormatter::default();
    let strings: Vec<String> = deserialize(strings, "tab strings")?;
    let tuning: Vec<String> = deserialize(tuning, "tuning")?;
    if strings.len() != tuning.len() {
        return Err(JsValue::from_str("one tuning label per string required"));
    }

    let refs: Vec<&str> = strings.iter().map(String::as_str).collect();
    let aligned = align_strings(&refs).map_err(tab_error)?;
    let tabline = aligned.into_tab_line(tuning);

    with_document(|doc| {
        let pending = tab::convert_empty_to_tab(doc, row, tabline.clone()).map_err(edit_error)?;
        serialize(&run_edit(doc, pending, &fmt)?, "edit outcome")
    })
}
