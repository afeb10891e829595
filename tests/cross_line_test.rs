// Cross-line merges and line splits.

use songsheet_wasm::edit::content;
use songsheet_wasm::edit::context::{EditContext, EditDirection};
use songsheet_wasm::edit::error::EditError;
use songsheet_wasm::format::SheetFormatter;
use songsheet_wasm::models::component::Component;
use songsheet_wasm::models::line::{Document, Line, TitleLine};

fn fmt() -> SheetFormatter {
    SheetFormatter::default()
}

fn content_line(text: &str) -> Line {
    Line::content(vec![Component::word(text.to_string())])
}

fn line_text(doc: &mut Document, row: usize) -> String {
    match doc.line_mut(row) {
        Some(Line::Content(line)) => line.layout(&fmt()).content.text(),
        Some(Line::Empty) => String::new(),
        other => panic!("unexpected line kind: {other:?}"),
    }
}

#[test]
fn backspace_at_line_start_merges_onto_the_previous_line() {
    let mut doc = Document::new();
    doc.lines.push(content_line("hello"));
    doc.lines.push(content_line("world"));

    let ctx = EditContext::caret(1, 0, EditDirection::Backward);
    let cursor = content::apply(&mut doc, &ctx, None, &fmt()).expect("cross-line merge succeeds");

    assert_eq!(doc.lines.len(), 1, "the emptied line is removed");
    assert_eq!(line_text(&mut doc, 0), "helloworld");
    assert_eq!((cursor.line, cursor.col), (0, 5), "cursor sits at the junction");
}

#[test]
fn backspace_at_the_first_line_start_fails() {
    let mut doc = Document::new();
    doc.lines.push(content_line("hello"));

    let ctx = EditContext::caret(0, 0, EditDirection::Backward);
    let err = content::delete(&doc, &ctx, &fmt()).unwrap_err();

    assert_eq!(err, EditError::NoLineBefore);
}

#[test]
fn forward_delete_at_the_last_line_end_fails() {
    let mut doc = Document::new();
    doc.lines.push(content_line("hello"));

    let ctx = EditContext::caret(0, 5, EditDirection::Forward);
    let err = content::delete(&doc, &ctx, &fmt()).unwrap_err();

    assert_eq!(err, EditError::NoLineAfter);
}

#[test]
fn forward_delete_at_line_end_pulls_the_next_line_up() {
    let mut doc = Document::new();
    doc.lines.push(content_line("good"));
    doc.lines.push(content_line("bye"));

    let ctx = EditContext::caret(0, 4, EditDirection::Forward);
    let cursor = content::apply(&mut doc, &ctx, None, &fmt()).expect("merge succeeds");

    assert_eq!(doc.lines.len(), 1);
    assert_eq!(line_text(&mut doc, 0), "goodbye");
    assert_eq!((cursor.line, cursor.col), (0, 4));
}

#[test]
fn backspace_into_an_empty_line_removes_it() {
    let mut doc = Document::new();
    doc.lines.push(Line::Empty);
    doc.lines.push(content_line("verse"));

    let ctx = EditContext::caret(1, 0, EditDirection::Backward);
    let cursor = content::apply(&mut doc, &ctx, None, &fmt()).expect("merge succeeds");

    assert_eq!(doc.lines.len(), 1);
    assert_eq!(line_text(&mut doc, 0), "verse");
    assert_eq!((cursor.line, cursor.col), (0, 0));
}

#[test]
fn merging_into_a_tab_line_is_refused() {
    let mut doc = Document::new();
    doc.lines
        .push(Line::Tab(songsheet_wasm::models::tabline::TabLine::new(
            vec!["e".into()],
        )));
    doc.lines.push(content_line("lyric"));

    let ctx = EditContext::caret(1, 0, EditDirection::Backward);
    let err = content::delete(&doc, &ctx, &fmt()).unwrap_err();

    assert_eq!(err, EditError::CrossesLineBreak);
}

#[test]
fn newline_splits_the_line_at_the_caret() {
    let mut doc = Document::new();
    doc.lines.push(content_line("goodbye"));

    let ctx = EditContext::caret(0, 4, EditDirection::Backward);
    let cursor = content::apply(&mut doc, &ctx, Some("\n"), &fmt()).expect("split succeeds");

    assert_eq!(doc.lines.len(), 2);
    assert_eq!(line_text(&mut doc, 0), "good");
    assert_eq!(line_text(&mut doc, 1), "bye");
    assert_eq!((cursor.line, cursor.col), (1, 0));
}

#[test]
fn newline_at_line_end_creates_an_empty_sibling() {
    let mut doc = Document::new();
    doc.lines.push(content_line("done"));

    let ctx = EditContext::caret(0, 4, EditDirection::Backward);
    let cursor = content::apply(&mut doc, &ctx, Some("\n"), &fmt()).expect("split succeeds");

    assert_eq!(doc.lines.len(), 2);
    assert_eq!(line_text(&mut doc, 0), "done");
    assert!(matches!(doc.line(1), Some(Line::Empty)));
    assert_eq!((cursor.line, cursor.col), (1, 0));
}

#[test]
fn pasted_text_with_a_newline_lands_on_both_lines() {
    let mut doc = Document::new();
    doc.lines.push(content_line("ab"));

    let ctx = EditContext::caret(0, 1, EditDirection::Backward);
    let cursor = content::apply(&mut doc, &ctx, Some("x\ny"), &fmt()).expect("split succeeds");

    assert_eq!(doc.lines.len(), 2);
    assert_eq!(line_text(&mut doc, 0), "ax");
    assert_eq!(line_text(&mut doc, 1), "yb");
    assert_eq!((cursor.line, cursor.col), (1, 1));
}

#[test]
fn title_label_edits_stay_inside_the_brackets() {
    let mut doc = Document::new();
    doc.lines.push(Line::Title(TitleLine::new("Chorus")));

    // Insert at display column 7 (after "Chorus"), then delete it back.
    let ctx = EditContext::caret(0, 7, EditDirection::Backward);
    let cursor = content::apply(&mut doc, &ctx, Some("!"), &fmt()).expect("title insert succeeds");
    assert_eq!(cursor.col, 8);

    match doc.line(0) {
        Some(Line::Title(title)) => assert_eq!(title.label, "Chorus!"),
        other => panic!("expected a title line, got {other:?}"),
    }

    let ctx = EditContext::caret(0, 8, EditDirection::Backward);
    content::apply(&mut doc, &ctx, None, &fmt()).expect("title backspace succeeds");
    match doc.line(0) {
        Some(Line::Title(title)) => assert_eq!(title.label, "Chorus"),
        other => panic!("expected a title line, got {other:?}"),
    }
}
