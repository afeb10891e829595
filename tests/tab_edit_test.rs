// Tablature parsing, alignment, and grid edits at the document level.

use songsheet_wasm::edit::context::PendingEdit;
use songsheet_wasm::edit::error::{EditError, TabParseError};
use songsheet_wasm::edit::{commit_all, tab};
use songsheet_wasm::format::SheetFormatter;
use songsheet_wasm::models::component::Component;
use songsheet_wasm::models::line::{Document, Line};
use songsheet_wasm::models::offset::RenderBounds;
use songsheet_wasm::parse::tab::align_strings;
use songsheet_wasm::renderers::tab_grid;

fn fmt() -> SheetFormatter {
    SheetFormatter::default()
}

fn tab_doc(strings: &[&str], tuning: &[&str]) -> Document {
    let mut doc = Document::new();
    doc.lines.push(Line::Empty);
    let tuning: Vec<String> = tuning.iter().map(|t| t.to_string()).collect();
    let tabline = align_strings(strings)
        .expect("fixture aligns")
        .into_tab_line(tuning);
    let pending = tab::convert_empty_to_tab(&doc, 0, tabline).expect("conversion accepted");
    pending.commit(&mut doc, &fmt()).expect("commit succeeds");
    doc
}

fn rows(doc: &mut Document, row: usize) -> Vec<String> {
    match doc.line_mut(row) {
        Some(Line::Tab(tabline)) => tab_grid::render(tabline).rows,
        other => panic!("expected a tab line, got {other:?}"),
    }
}

#[test]
fn aligned_input_renders_in_lock_step() {
    let mut doc = tab_doc(&["0--2", "---3", "1---"], &["e", "B", "G"]);

    let tab = doc.line(0).unwrap().as_tab().unwrap();
    assert_eq!(tab.columns.len(), 4, "one column per input position");

    assert_eq!(
        rows(&mut doc, 0),
        vec!["e|0--2", "B|---3", "G|1---"],
        "all three strings stay column-aligned"
    );
}

#[test]
fn conversion_requires_an_empty_line() {
    let mut doc = Document::new();
    doc.lines.push(Line::content(vec![Component::word("lyric")]));
    let tabline = align_strings(&["0"]).unwrap().into_tab_line(vec!["e".into()]);

    let err = tab::convert_empty_to_tab(&doc, 0, tabline).unwrap_err();
    assert_eq!(err, EditError::InvalidPosition);
}

#[test]
fn mismatched_bars_refuse_to_align() {
    let err = align_strings(&["0-|2", "-0-|"]).unwrap_err();
    assert_eq!(err, TabParseError::BarUnaligned);
}

#[test]
fn typing_digits_carries_into_two_digit_frets() {
    let mut doc = tab_doc(&["0--", "---"], &["e", "B"]);

    // Column 0 renders at display column 2.
    tab::set_note(&doc, 0, 2, 1, 1)
        .expect("first digit accepted")
        .commit(&mut doc, &fmt())
        .expect("commit succeeds");
    let pending = tab::set_note(&doc, 0, 2, 1, 2).expect("second digit accepted");
    pending.commit(&mut doc, &fmt()).expect("commit succeeds");

    let tab = doc.line(0).unwrap().as_tab().unwrap();
    assert_eq!(tab.columns[0].as_ref().unwrap().notes[1], Some(12));
    assert_eq!(
        rows(&mut doc, 0),
        vec!["e|0---", "B|12--"],
        "the two-digit fret widens its column on every string"
    );
}

#[test]
fn bar_columns_refuse_edits() {
    let mut doc = tab_doc(&["0-|2-|", "4-|-5|"], &["e", "B"]);

    let err = tab::set_note(&doc, 0, 1, 0, 3).unwrap_err();
    assert_eq!(err, EditError::BarLine, "the gutter bar is not editable");

    let err = tab::delete_columns(&doc, 0, RenderBounds::new(3, 6)).unwrap_err();
    assert_eq!(
        err,
        EditError::BarLine,
        "selections across a bar line are refused"
    );
}

#[test]
fn clearing_the_last_note_converts_back_to_an_empty_line() {
    let mut doc = tab_doc(&["7", "-"], &["e", "B"]);

    let pending = tab::clear_note(&doc, 0, 2, 0).expect("clear accepted");
    pending.commit(&mut doc, &fmt()).expect("commit succeeds");

    assert!(matches!(doc.line(0), Some(Line::Empty)));
}

#[test]
fn box_delete_applies_to_every_line_or_none() {
    let mut doc = Document::new();
    doc.lines.push(Line::Empty);
    doc.lines.push(Line::Empty);
    for row in 0..2 {
        let tabline = align_strings(&["0-2", "1-3"])
            .unwrap()
            .into_tab_line(vec!["e".into(), "B".into()]);
        let pending = tab::convert_empty_to_tab(&doc, row, tabline).expect("conversion accepted");
        pending.commit(&mut doc, &fmt()).expect("commit succeeds");
    }

    // Delete the first column on both lines at once.
    let pendings: Vec<PendingEdit> =
        tab::box_delete(&doc, &[0, 1], RenderBounds::new(2, 3)).expect("both lines accept");
    commit_all(&mut doc, pendings, &fmt()).expect("batch commit succeeds");
    for row in 0..2 {
        let tab = doc.line(row).unwrap().as_tab().unwrap();
        assert_eq!(tab.columns.len(), 2);
    }

    // A batch touching a non-tab line is refused before any commit.
    doc.lines.push(Line::content(vec![Component::word("x")]));
    let before = doc.clone();
    let err = tab::box_delete(&doc, &[0, 2], RenderBounds::new(2, 3)).unwrap_err();
    assert_eq!(err, EditError::InvalidPosition);
    assert_eq!(doc, before, "no line committed");
}
