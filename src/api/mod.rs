//! Song Sheet Editor WASM API
//!
//! JavaScript-facing surface of the editing engine. The module owns
//! the canonical document behind a mutex; the UI layer captures
//! browser selection/input events, calls the edit entry points with
//! display-coordinate selections, and re-renders the returned dirty
//! lines at the returned cursor position.
//!
//! # Module Structure
//!
//! - `helpers`: serialization, validation, error conversion, logging
//! - `edits`: document lifecycle plus content/annotation/tab edits

pub mod edits;
pub mod helpers;

pub use edits::{
    annotation_delete, annotation_insert, delete_selection, get_document, insert_text,
    load_document, new_document, parse_tab_input, render_line, restore_document,
    snapshot_document, tab_box_delete, tab_clear_note, tab_delete_columns, tab_set_note,
    EditOutcome, RenderedLine,
};
