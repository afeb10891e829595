// Store/restore round trip for document snapshots.

use std::fs;
use std::io::Write;

use songsheet_wasm::format::SheetFormatter;
use songsheet_wasm::models::component::{Attachment, Component};
use songsheet_wasm::models::line::{Document, Line, TitleLine};
use songsheet_wasm::models::offset::ContentOffset;
use songsheet_wasm::parse::tab::align_strings;

fn full_document() -> Document {
    let mut hello = Component::word("hello");
    hello.push_attachment(Attachment::chord("Cmaj7", ContentOffset::new(0)));
    hello.push_attachment(Attachment::text("(soft)", ContentOffset::new(3)));

    let mut doc = Document::new();
    doc.lines.push(Line::Title(TitleLine::new("Verse 1")));
    doc.lines.push(Line::content(vec![
        hello,
        Component::space(" "),
        Component::word("world"),
    ]));
    doc.lines.push(Line::Empty);
    doc.lines.push(Line::Tab(
        align_strings(&["0-|2-|", "4-|-5|"])
            .expect("fixture aligns")
            .into_tab_line(vec!["e".into(), "B".into()]),
    ));
    doc
}

#[test]
fn snapshot_restores_content_and_attachment_offsets_exactly() {
    let doc = full_document();
    let snapshot = doc.snapshot().expect("snapshot succeeds");

    let restored = Document::restore(&snapshot).expect("restore succeeds");
    assert_eq!(restored, doc);

    // The round trip is stable.
    assert_eq!(restored.snapshot().expect("second snapshot"), snapshot);
}

#[test]
fn snapshot_survives_a_trip_through_a_file() {
    let doc = full_document();
    let snapshot = doc.snapshot().expect("snapshot succeeds");

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(snapshot.as_bytes()).expect("write snapshot");

    let read_back = fs::read_to_string(file.path()).expect("read snapshot");
    let restored = Document::restore(&read_back).expect("restore succeeds");
    assert_eq!(restored, doc);
}

#[test]
fn render_caches_are_not_part_of_the_snapshot() {
    let mut doc = full_document();
    let clean_snapshot = doc.snapshot().expect("snapshot succeeds");

    // Building layouts fills caches; the snapshot must not change.
    let fmt = SheetFormatter::default();
    if let Some(Line::Content(line)) = doc.line_mut(1) {
        line.layout(&fmt);
    }
    assert_eq!(doc.snapshot().expect("snapshot succeeds"), clean_snapshot);
}
