// Attachment editing: trim, remove, move, and the no-overlap invariant.

use songsheet_wasm::edit::annotation::{self, AnnotationContext};
use songsheet_wasm::edit::context::EditDirection;
use songsheet_wasm::edit::error::EditError;
use songsheet_wasm::format::SheetFormatter;
use songsheet_wasm::models::component::{Attachment, Component};
use songsheet_wasm::models::line::{Document, Line};
use songsheet_wasm::models::offset::{ContentOffset, RenderBounds};

fn fmt() -> SheetFormatter {
    SheetFormatter::default()
}

/// "hello world" with a C chord over the 'h'.
fn base_doc() -> Document {
    let mut hello = Component::word("hello");
    hello.push_attachment(Attachment::chord("C", ContentOffset::new(0)));
    let mut doc = Document::new();
    doc.lines.push(Line::content(vec![
        hello,
        Component::space(" "),
        Component::word("world"),
    ]));
    doc
}

fn attachments(doc: &Document, row: usize) -> Vec<(usize, usize, String)> {
    let line = doc.line(row).unwrap().as_content().unwrap();
    let mut out = Vec::new();
    for (ci, comp) in line.components.iter().enumerate() {
        for att in &comp.attachments {
            out.push((ci, att.offset.value(), att.value.clone()));
        }
    }
    out
}

fn insert_at(doc: &mut Document, col: usize, text: &str) -> Result<usize, EditError> {
    let ctx = AnnotationContext {
        line: 0,
        selection: RenderBounds::at(col),
        direction: EditDirection::Backward,
    };
    let pending = annotation::insert(doc, &ctx, text, &fmt())?;
    let cursor = pending.commit(doc, &fmt())?;
    Ok(cursor.col)
}

#[test]
fn chord_text_on_a_free_column_anchors_a_new_attachment() {
    let mut doc = base_doc();

    let cursor_col = insert_at(&mut doc, 6, "G").expect("insert succeeds");

    assert_eq!(
        attachments(&doc, 0),
        vec![(0, 0, "C".to_string()), (2, 0, "G".to_string())]
    );
    assert_eq!(cursor_col, 7, "cursor lands after the new chord");
}

#[test]
fn typing_at_an_attachment_boundary_edits_its_text() {
    let mut doc = base_doc();
    insert_at(&mut doc, 6, "G").expect("first insert succeeds");

    // G renders at columns 6..7; typing at column 7 appends to it
    // instead of anchoring a second attachment on the same offset.
    let cursor_col = insert_at(&mut doc, 7, "m").expect("edit succeeds");

    assert_eq!(
        attachments(&doc, 0),
        vec![(0, 0, "C".to_string()), (2, 0, "Gm".to_string())]
    );
    assert_eq!(cursor_col, 8);
}

#[test]
fn whitespace_at_the_start_column_moves_the_attachment_right() {
    let mut doc = base_doc();
    insert_at(&mut doc, 6, "G").expect("insert succeeds");

    insert_at(&mut doc, 6, " ").expect("move succeeds");

    assert_eq!(
        attachments(&doc, 0),
        vec![(0, 0, "C".to_string()), (2, 1, "G".to_string())]
    );
}

#[test]
fn whitespace_after_the_end_moves_the_attachment_left() {
    let mut doc = base_doc();
    insert_at(&mut doc, 6, "G").expect("insert succeeds");
    insert_at(&mut doc, 6, " ").expect("move right succeeds");

    // G now renders at columns 7..8; a space typed at column 8 pulls
    // it back.
    insert_at(&mut doc, 8, " ").expect("move left succeeds");

    assert_eq!(
        attachments(&doc, 0),
        vec![(0, 0, "C".to_string()), (2, 0, "G".to_string())]
    );
}

#[test]
fn moving_onto_an_occupied_offset_is_refused_and_nothing_changes() {
    let mut doc = base_doc();
    insert_at(&mut doc, 6, "G").expect("insert at offset 0 succeeds");
    insert_at(&mut doc, 7, "D").expect("insert at offset 1 succeeds");
    let before = attachments(&doc, 0);

    let err = insert_at(&mut doc, 6, " ").unwrap_err();

    assert_eq!(err, EditError::AttachmentExists);
    assert_eq!(attachments(&doc, 0), before);
}

#[test]
fn no_two_attachments_share_an_offset_after_edit_sequences() {
    let mut doc = base_doc();
    insert_at(&mut doc, 6, "G").expect("insert succeeds");
    insert_at(&mut doc, 6, " ").expect("move succeeds");
    insert_at(&mut doc, 6, "D").expect("insert into the vacated slot succeeds");

    let line = doc.line(0).unwrap().as_content().unwrap();
    for comp in &line.components {
        let mut offsets: Vec<_> = comp
            .attachments
            .iter()
            .filter(|a| !a.is_empty())
            .map(|a| a.offset)
            .collect();
        offsets.sort();
        offsets.dedup();
        assert_eq!(
            offsets.len(),
            comp.attachments.iter().filter(|a| !a.is_empty()).count(),
            "duplicate attachment offsets on {:?}",
            comp.value
        );
    }
}

#[test]
fn deleting_inside_one_attachment_trims_its_text() {
    let mut hello = Component::word("hello");
    hello.push_attachment(Attachment::chord("Am7", ContentOffset::new(0)));
    let mut doc = Document::new();
    doc.lines.push(Line::content(vec![hello]));

    let ctx = AnnotationContext {
        line: 0,
        selection: RenderBounds::new(1, 2),
        direction: EditDirection::Backward,
    };
    let pending = annotation::delete(&doc, &ctx, &fmt()).expect("trim succeeds");
    pending.commit(&mut doc, &fmt()).expect("commit succeeds");

    assert_eq!(attachments(&doc, 0), vec![(0, 0, "A7".to_string())]);
}

#[test]
fn deleting_a_fully_selected_attachment_removes_it() {
    let mut doc = base_doc();

    let ctx = AnnotationContext {
        line: 0,
        selection: RenderBounds::new(0, 1),
        direction: EditDirection::Backward,
    };
    let pending = annotation::delete(&doc, &ctx, &fmt()).expect("remove succeeds");
    pending.commit(&mut doc, &fmt()).expect("commit succeeds");

    assert!(attachments(&doc, 0).is_empty());
}

#[test]
fn partially_covering_several_attachments_is_refused() {
    let mut doc = base_doc();
    insert_at(&mut doc, 6, "Am7").expect("insert succeeds");
    let before = attachments(&doc, 0);

    // Columns 0..7 cover C fully but cut into Am7 (6..9).
    let ctx = AnnotationContext {
        line: 0,
        selection: RenderBounds::new(0, 7),
        direction: EditDirection::Backward,
    };
    let err = annotation::delete(&doc, &ctx, &fmt()).unwrap_err();

    assert_eq!(err, EditError::PartialAttachment);
    assert_eq!(attachments(&doc, 0), before);
}

#[test]
fn deleting_across_fully_selected_attachments_removes_them_all() {
    let mut doc = base_doc();
    insert_at(&mut doc, 6, "G").expect("insert succeeds");

    let ctx = AnnotationContext {
        line: 0,
        selection: RenderBounds::new(0, 7),
        direction: EditDirection::Backward,
    };
    let pending = annotation::delete(&doc, &ctx, &fmt()).expect("remove succeeds");
    pending.commit(&mut doc, &fmt()).expect("commit succeeds");

    assert!(attachments(&doc, 0).is_empty());
}
