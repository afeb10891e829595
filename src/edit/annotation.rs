//! Annotation edit engine
//!
//! Attachments are edited purely by display range against the
//! annotation track — their rendered span need not line up with their
//! anchor component's span. Deletion trims a single attachment or
//! removes fully-selected ones; a selection that cuts partway into
//! more than one attachment is refused. Whitespace typed at an
//! attachment's boundary *moves* the attachment instead of editing its
//! text: one content position right from its start column, one left
//! from just past its end. A move across components is an explicit
//! detach followed by an attach, never a shared reference.

use super::context::{CursorTarget, EditDirection, PendingEdit};
use super::error::EditError;
use crate::format::Formatter;
use crate::models::component::Attachment;
use crate::models::line::{ContentLine, Document, Line};
use crate::models::offset::{Bias, ContentOffset, ContentPosition, RenderBounds};
use crate::renderers::line_builder::{AttachmentBounds, LineLayout};
use crate::utils::grapheme::{char_count, insert_chars, remove_chars};

/// An annotation-track edit request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnnotationContext {
    pub line: usize,
    pub selection: RenderBounds,
    pub direction: EditDirection,
}

/// Delete inside the annotation track.
pub fn delete(
    doc: &Document,
    ctx: &AnnotationContext,
    fmt: &dyn Formatter,
) -> Result<PendingEdit, EditError> {
    let mut content = content_line(doc, ctx.line)?;
    let layout = LineLayout::build(&content.components, fmt);
    let track_width = layout
        .annotation
        .as_ref()
        .map(|t| t.width)
        .ok_or(EditError::NoComponent)?;

    let sel = if ctx.selection.is_empty() {
        match ctx.direction {
            EditDirection::Backward => {
                if ctx.selection.start == 0 {
                    return Err(EditError::NoComponent);
                }
                RenderBounds::new(ctx.selection.start - 1, ctx.selection.start)
            }
            EditDirection::Forward => {
                if ctx.selection.start >= track_width {
                    return Err(EditError::NoComponent);
                }
                RenderBounds::new(ctx.selection.start, ctx.selection.start + 1)
            }
        }
    } else {
        ctx.selection
    };

    let hits: Vec<AttachmentBounds> = layout
        .attachments
        .iter()
        .filter(|ab| ab.bounds.intersects(&sel))
        .copied()
        .collect();

    match hits.as_slice() {
        [] => Err(EditError::NoComponent),
        [ab] => {
            let from = sel.start.max(ab.bounds.start) - ab.bounds.start;
            let to = sel.after.min(ab.bounds.after) - ab.bounds.start;
            let att = &mut content.components[ab.component].attachments[ab.attachment];
            att.value = remove_chars(&att.value, from, to);
            if att.is_empty() {
                content.components[ab.component].detach(ab.attachment);
            }
            content.invalidate_layout();
            finish(ctx.line, content, sel.start)
        }
        many => {
            if !many.iter().all(|ab| sel.covers(&ab.bounds)) {
                return Err(EditError::PartialAttachment);
            }
            // Detach back to front so list indices stay valid.
            let mut doomed: Vec<(usize, usize)> =
                many.iter().map(|ab| (ab.component, ab.attachment)).collect();
            doomed.sort();
            for (comp, att) in doomed.into_iter().rev() {
                content.components[comp].detach(att);
            }
            content.invalidate_layout();
            finish(ctx.line, content, sel.start)
        }
    }
}

/// Insert into the annotation track: whitespace at an attachment's
/// boundary moves it, text inside an attachment edits it, and text on
/// a free column creates a new attachment over the content below.
pub fn insert(
    doc: &Document,
    ctx: &AnnotationContext,
    text: &str,
    fmt: &dyn Formatter,
) -> Result<PendingEdit, EditError> {
    if text.is_empty() {
        return Err(EditError::InvalidPosition);
    }
    let content = content_line(doc, ctx.line)?;
    let layout = LineLayout::build(&content.components, fmt);
    let col = ctx.selection.start;

    if text.chars().all(char::is_whitespace) {
        if let Some(ab) = layout.attachments.iter().find(|ab| ab.bounds.start == col) {
            return move_attachment(ctx.line, content, &layout, *ab, MoveDirection::Right);
        }
        if let Some(ab) = layout.attachments.iter().find(|ab| ab.bounds.after == col) {
            return move_attachment(ctx.line, content, &layout, *ab, MoveDirection::Left);
        }
        return Err(EditError::InvalidPosition);
    }

    if let Some(ab) = layout
        .attachments
        .iter()
        .find(|ab| ab.bounds.start <= col && col <= ab.bounds.after)
    {
        let mut content = content;
        let at = col - ab.bounds.start;
        let att = &mut content.components[ab.component].attachments[ab.attachment];
        att.value = insert_chars(&att.value, at, text);
        content.invalidate_layout();
        return finish(ctx.line, content, col + char_count(text));
    }

    attach_new(ctx.line, content, &layout, col, text, fmt)
}

enum MoveDirection {
    Left,
    Right,
}

fn content_line(doc: &Document, line: usize) -> Result<ContentLine, EditError> {
    match doc.line(line).ok_or(EditError::InvalidPosition)? {
        Line::Content(content) => Ok(content.clone()),
        _ => Err(EditError::InvalidPosition),
    }
}

fn finish(line: usize, content: ContentLine, col: usize) -> Result<PendingEdit, EditError> {
    let replacement = if content.is_blank() {
        Line::Empty
    } else {
        Line::Content(content)
    };
    Ok(PendingEdit::replace_line(
        line,
        replacement,
        CursorTarget::Column { line, col },
    ))
}

/// The next real content position at or beyond `col`, scanning in the
/// given direction over virtual columns.
fn real_position(
    layout: &LineLayout,
    col: usize,
    dir: &MoveDirection,
) -> Option<(usize, ContentOffset)> {
    let width = layout.width();
    let mut c = col;
    loop {
        if c > width {
            return None;
        }
        let (comp, pos) = layout.content_position(c);
        match pos {
            ContentPosition::Real(offset) => return comp.map(|comp| (comp, offset)),
            ContentPosition::Virtual(_) => {
                let el = layout.content.element_at(c.min(width.saturating_sub(1)))?;
                match dir {
                    MoveDirection::Right => {
                        let next = el.start + el.width;
                        if next <= c {
                            return None;
                        }
                        c = next;
                    }
                    MoveDirection::Left => {
                        if el.start == 0 {
                            return None;
                        }
                        c = el.start - 1;
                    }
                }
            }
        }
    }
}

/// Relocate an attachment one content position left or right. The
/// relink is an explicit detach/attach pair, possibly across
/// components.
fn move_attachment(
    line: usize,
    mut content: ContentLine,
    layout: &LineLayout,
    ab: AttachmentBounds,
    dir: MoveDirection,
) -> Result<PendingEdit, EditError> {
    let anchor = content.components[ab.component].attachments[ab.attachment].offset;
    let here = layout
        .display_offset(ab.component, anchor, Bias::KeepRight)
        .ok_or(EditError::InvalidPosition)?;

    let target_col = match dir {
        MoveDirection::Right => here + 1,
        MoveDirection::Left => here.checked_sub(1).ok_or(EditError::InvalidPosition)?,
    };
    let (target_comp, target_offset) =
        real_position(layout, target_col, &dir).ok_or(EditError::InvalidPosition)?;

    if content.components[target_comp]
        .attachment_at(target_offset)
        .is_some()
    {
        return Err(EditError::AttachmentExists);
    }

    let mut att = content.components[ab.component].detach(ab.attachment);
    att.offset = target_offset;
    att.render = None;
    if !content.components[target_comp].try_attach(att) {
        return Err(EditError::AttachmentExists);
    }
    content.invalidate_layout();

    Ok(PendingEdit::replace_line(
        line,
        Line::Content(content),
        CursorTarget::AttachmentEdge {
            line,
            component: target_comp,
            anchor: target_offset,
            end: false,
        },
    ))
}

/// Create a new attachment anchored under a free annotation column.
fn attach_new(
    line: usize,
    mut content: ContentLine,
    layout: &LineLayout,
    col: usize,
    text: &str,
    fmt: &dyn Formatter,
) -> Result<PendingEdit, EditError> {
    let (comp, offset) =
        real_position(layout, col, &MoveDirection::Right).ok_or(EditError::NoComponent)?;

    if content.components[comp].attachment_at(offset).is_some() {
        return Err(EditError::AttachmentExists);
    }

    let kind = fmt.classify_attachment(text);
    if !content.components[comp].try_attach(Attachment::new(kind, text, offset)) {
        return Err(EditError::AttachmentExists);
    }
    content.invalidate_layout();

    Ok(PendingEdit::replace_line(
        line,
        Line::Content(content),
        CursorTarget::AttachmentEdge {
            line,
            component: comp,
            anchor: offset,
            end: true,
        },
    ))
}
