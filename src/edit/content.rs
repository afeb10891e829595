//! Content edit engine
//!
//! Translates selection-range edits in display coordinates into
//! structural mutations of a line's component sequence: trimming the
//! components straddling the range edges, removing everything fully
//! inside, merging or splitting around inserted content, and merging
//! whole lines when a delete crosses a line boundary.
//!
//! Every operation validates on clones and returns a `PendingEdit`;
//! the document itself is only touched at commit time. Cursor
//! placement is computed symbolically during mutation and resolved
//! against the rebuilt display projection, because the virtual/filler
//! structure around the cursor only exists after the rebuild.

use std::collections::VecDeque;

use super::context::{
    CursorPosition, CursorTarget, DeleteScope, EditContext, EditDirection, PendingEdit,
};
use super::error::EditError;
use crate::format::Formatter;
use crate::models::component::{AllowedKinds, Component};
use crate::models::line::{ContentLine, Document, Line, TitleLine};
use crate::models::offset::{Bias, ContentOffset, RenderBounds};
use crate::renderers::line_builder::LineLayout;
use crate::renderers::track::ElementRole;
use crate::utils::grapheme::{char_count, insert_chars, remove_chars};

/// Validate and commit in one step.
pub fn apply(
    doc: &mut Document,
    ctx: &EditContext,
    text: Option<&str>,
    fmt: &dyn Formatter,
) -> Result<CursorPosition, EditError> {
    let pending = match text {
        Some(text) => insert(doc, ctx, text, fmt)?,
        None => delete(doc, ctx, fmt)?,
    };
    pending.commit(doc, fmt)
}

/// Delete the selection, or one position in the edit direction when
/// the selection is empty. At line edges this becomes a cross-line
/// merge.
pub fn delete(
    doc: &Document,
    ctx: &EditContext,
    fmt: &dyn Formatter,
) -> Result<PendingEdit, EditError> {
    match doc.line(ctx.line).ok_or(EditError::InvalidPosition)? {
        Line::Content(content) => delete_in_content(doc, ctx, content, fmt),
        Line::Empty => match ctx.direction {
            EditDirection::Backward => merge_with_previous(doc, ctx.line, fmt),
            EditDirection::Forward => merge_with_next(doc, ctx.line, fmt),
        },
        Line::Title(title) => delete_in_title(doc, ctx, title, fmt),
        Line::Tab(_) => Err(EditError::InvalidPosition),
    }
}

/// Insert `text` over the selection (which may be empty).
pub fn insert(
    doc: &Document,
    ctx: &EditContext,
    text: &str,
    fmt: &dyn Formatter,
) -> Result<PendingEdit, EditError> {
    match doc.line(ctx.line).ok_or(EditError::InvalidPosition)? {
        Line::Content(content) => {
            let content = content.clone();
            let layout = LineLayout::build(&content.components, fmt);
            replace_range(ctx.line, content, &layout, ctx.selection, text, Bias::KeepLeft, fmt)
        }
        Line::Empty => {
            let content = ContentLine::default();
            let layout = LineLayout::build(&content.components, fmt);
            replace_range(ctx.line, content, &layout, RenderBounds::at(0), text, Bias::KeepLeft, fmt)
        }
        Line::Title(title) => edit_title(ctx.line, title, ctx.selection, text),
        Line::Tab(_) => Err(EditError::InvalidPosition),
    }
}

fn delete_in_content(
    doc: &Document,
    ctx: &EditContext,
    content: &ContentLine,
    fmt: &dyn Formatter,
) -> Result<PendingEdit, EditError> {
    let content = content.clone();
    let layout = LineLayout::build(&content.components, fmt);
    let sel = ctx.selection;

    if !sel.is_empty() {
        let bias = match ctx.direction {
            EditDirection::Backward => Bias::KeepLeft,
            EditDirection::Forward => Bias::KeepRight,
        };
        return replace_range(ctx.line, content, &layout, sel, "", bias, fmt);
    }

    match ctx.direction {
        EditDirection::Backward => {
            if sel.start == 0 {
                return merge_with_previous(doc, ctx.line, fmt);
            }
            match widen_backward(&layout, sel.start, ctx.scope)? {
                Some(from) => {
                    let range = RenderBounds::new(from, sel.start);
                    replace_range(ctx.line, content, &layout, range, "", Bias::KeepLeft, fmt)
                }
                None => merge_with_previous(doc, ctx.line, fmt),
            }
        }
        EditDirection::Forward => {
            if sel.start >= layout.width() {
                return merge_with_next(doc, ctx.line, fmt);
            }
            match widen_forward(&layout, sel.start, ctx.scope)? {
                Some(to) => {
                    let range = RenderBounds::new(sel.start, to);
                    replace_range(ctx.line, content, &layout, range, "", Bias::KeepRight, fmt)
                }
                None => merge_with_next(doc, ctx.line, fmt),
            }
        }
    }
}

/// Widen a caret one position leftward, skipping virtual columns.
/// `None` means only virtual columns remain to the left: the delete
/// reaches the line edge.
fn widen_backward(
    layout: &LineLayout,
    col: usize,
    scope: DeleteScope,
) -> Result<Option<usize>, EditError> {
    let mut c = col;
    loop {
        if c == 0 {
            return Ok(None);
        }
        let el = layout.content.element_at(c - 1).ok_or(EditError::Internal)?;
        if el.role == ElementRole::Content {
            return match scope {
                DeleteScope::Character => Ok(Some(c - 1)),
                DeleteScope::Word => {
                    let comp = el.component.ok_or(EditError::Internal)?;
                    Ok(Some(layout.components[comp].start.min(c - 1)))
                }
            };
        }
        c = el.start;
    }
}

/// Widen a caret one position rightward, skipping virtual columns.
fn widen_forward(
    layout: &LineLayout,
    col: usize,
    scope: DeleteScope,
) -> Result<Option<usize>, EditError> {
    let mut c = col;
    loop {
        if c >= layout.width() {
            return Ok(None);
        }
        let el = layout.content.element_at(c).ok_or(EditError::Internal)?;
        if el.role == ElementRole::Content {
            return match scope {
                DeleteScope::Character => Ok(Some(c + 1)),
                DeleteScope::Word => {
                    let comp = el.component.ok_or(EditError::Internal)?;
                    Ok(Some(layout.components[comp].after.max(c + 1)))
                }
            };
        }
        c = el.start + el.width;
    }
}

/// Content characters of `component` rendered strictly before `col`.
fn chars_before(layout: &LineLayout, component: usize, col: usize) -> usize {
    layout
        .content
        .elements
        .iter()
        .filter(|el| el.role == ElementRole::Content && el.component == Some(component))
        .map(|el| {
            if col >= el.start + el.width {
                el.width
            } else if col <= el.start {
                0
            } else {
                col - el.start
            }
        })
        .sum()
}

/// Range replacement: trim the edge components, drop what the range
/// covers, weave new content in, and re-scan for merges.
fn replace_range(
    line_idx: usize,
    content: ContentLine,
    layout: &LineLayout,
    range: RenderBounds,
    text: &str,
    bias: Bias,
    fmt: &dyn Formatter,
) -> Result<PendingEdit, EditError> {
    if let Some((before, after)) = text.split_once('\n') {
        return split_line(line_idx, content, layout, range, before, after, fmt);
    }

    let allowed = content.allowed_kinds();
    let (mut prefix, mut suffix) = carve(&content, layout, range, allowed, fmt)?;

    let mut middle: VecDeque<Component> =
        fmt.parse_components(text, allowed).into();
    let inserted_any = !middle.is_empty();

    // (a) merge the head of the new content into the trimmed left edge.
    let mut cursor: (usize, ContentOffset);
    if let Some(first) = middle.front() {
        if let Some(last) = prefix.last_mut() {
            if last.try_merge(first, allowed, fmt).is_some() {
                middle.pop_front();
            }
        }
    }
    // (d) any remaining new components go in verbatim.
    prefix.extend(middle);

    cursor = match prefix.last() {
        Some(last) => (prefix.len() - 1, ContentOffset::new(last.len())),
        None => (0, ContentOffset::ZERO),
    };

    // (c) merge the tail of the new content into the right edge; for
    // pure deletes the re-scan below joins the halves instead.
    if inserted_any {
        if let (Some(last), Some(first)) = (prefix.last_mut(), suffix.first()) {
            if last.try_merge(first, allowed, fmt).is_some() {
                suffix.remove(0);
            }
        }
    }
    prefix.append(&mut suffix);

    let mut components = prefix;
    rescan(&mut components, &mut cursor, allowed, fmt);

    if components.is_empty() || components.iter().all(|c| c.is_empty() && !c.has_attachments()) {
        return Ok(PendingEdit::replace_line(
            line_idx,
            Line::Empty,
            CursorTarget::LineStart { line: line_idx },
        ));
    }

    let cursor = CursorTarget::InComponent {
        line: line_idx,
        component: cursor.0.min(components.len() - 1),
        offset: cursor.1,
        bias,
    };
    Ok(PendingEdit::replace_line(
        line_idx,
        Line::content(components),
        cursor,
    ))
}

/// Split the line's components around `range`: everything left of the
/// range (left edge trimmed) and everything right of it (right edge
/// trimmed). Components fully covered by the range are dropped, along
/// with their attachments.
fn carve(
    content: &ContentLine,
    layout: &LineLayout,
    range: RenderBounds,
    allowed: AllowedKinds,
    fmt: &dyn Formatter,
) -> Result<(Vec<Component>, Vec<Component>), EditError> {
    let mut prefix: Vec<Component> = Vec::new();
    let mut suffix: Vec<Component> = Vec::new();

    for (i, comp) in content.components.iter().enumerate() {
        let bounds = *layout.components.get(i).ok_or(EditError::Internal)?;

        if bounds.is_empty() {
            // Zero-width components inside the range disappear.
            if range.start <= bounds.start && bounds.start < range.after {
                continue;
            }
            if bounds.start <= range.start {
                prefix.push(comp.clone());
            } else {
                suffix.push(comp.clone());
            }
            continue;
        }

        if bounds.after <= range.start {
            prefix.push(comp.clone());
            continue;
        }
        if bounds.start >= range.after {
            suffix.push(comp.clone());
            continue;
        }

        let straddles_start = bounds.start < range.start;
        let straddles_end = bounds.after > range.after;
        let lo = chars_before(layout, i, range.start);
        let ro = chars_before(layout, i, range.after);

        if straddles_start && straddles_end {
            // Same component on both edges: split so the halves become
            // distinct left and right edges.
            let mut head = comp.clone();
            let mut tail = head.split_end(ContentOffset::new(ro));
            tail.invalidate_render();
            if !head.try_remove_content(
                ContentOffset::new(lo),
                ro.saturating_sub(lo),
                allowed,
                fmt,
            ) {
                return Err(EditError::TypeNotAllowed);
            }
            prefix.push(head);
            suffix.push(tail);
        } else if straddles_start {
            let mut head = comp.clone();
            let len = head.len();
            if !head.try_remove_content(
                ContentOffset::new(lo),
                len.saturating_sub(lo),
                allowed,
                fmt,
            ) {
                return Err(EditError::TypeNotAllowed);
            }
            prefix.push(head);
        } else if straddles_end {
            let mut tail = comp.clone();
            if !tail.try_remove_content(ContentOffset::ZERO, ro, allowed, fmt) {
                return Err(EditError::TypeNotAllowed);
            }
            suffix.push(tail);
        }
        // Fully inside: dropped.
    }

    Ok((prefix, suffix))
}

/// One merge pass over adjacent components, with cursor fix-up, plus
/// removal of empty leftovers. Keeps repeated edits from accumulating
/// component fragments.
fn rescan(
    components: &mut Vec<Component>,
    cursor: &mut (usize, ContentOffset),
    allowed: AllowedKinds,
    fmt: &dyn Formatter,
) {
    // Drop empty components that carry nothing.
    let mut i = 0;
    while i < components.len() {
        if components[i].is_empty() && !components[i].has_attachments() {
            components.remove(i);
            if cursor.0 > i {
                cursor.0 -= 1;
            } else if cursor.0 == i {
                *cursor = match i.checked_sub(1) {
                    Some(prev) => (prev, ContentOffset::new(components[prev].len())),
                    None => (0, ContentOffset::ZERO),
                };
            }
        } else {
            i += 1;
        }
    }

    let mut i = 0;
    while i + 1 < components.len() {
        let right = components[i + 1].clone();
        match components[i].try_merge(&right, allowed, fmt) {
            Some(result) => {
                components.remove(i + 1);
                if cursor.0 == i + 1 {
                    *cursor = (i, result.left_len + cursor.1.value());
                } else if cursor.0 > i + 1 {
                    cursor.0 -= 1;
                }
            }
            None => i += 1,
        }
    }
}

/// A newline in the inserted text cuts the line in two.
fn split_line(
    line_idx: usize,
    content: ContentLine,
    layout: &LineLayout,
    range: RenderBounds,
    before: &str,
    after: &str,
    fmt: &dyn Formatter,
) -> Result<PendingEdit, EditError> {
    let allowed = content.allowed_kinds();
    let (mut left, mut right) = carve(&content, layout, range, allowed, fmt)?;

    let mut left_cursor = (0, ContentOffset::ZERO);
    if !before.is_empty() {
        let mut middle: VecDeque<Component> = fmt.parse_components(before, allowed).into();
        if let (Some(first), Some(last)) = (middle.front(), left.last_mut()) {
            if last.try_merge(first, allowed, fmt).is_some() {
                middle.pop_front();
            }
        }
        left.extend(middle);
    }
    rescan(&mut left, &mut left_cursor, allowed, fmt);

    let parsed_after = fmt.parse_components(after, allowed);
    let after_count = parsed_after.len();
    let mut right_cursor = match parsed_after.last() {
        Some(last) => (after_count - 1, ContentOffset::new(last.len())),
        None => (0, ContentOffset::ZERO),
    };
    let mut merged_right = parsed_after;
    if let (Some(last), Some(first)) = (merged_right.last_mut(), right.first()) {
        if last.try_merge(first, allowed, fmt).is_some() {
            right.remove(0);
        }
    }
    merged_right.append(&mut right);
    rescan(&mut merged_right, &mut right_cursor, allowed, fmt);

    let left_line = if left.is_empty() {
        Line::Empty
    } else {
        Line::content(left)
    };
    let cursor = if merged_right.is_empty() || after_count == 0 {
        CursorTarget::Column {
            line: line_idx + 1,
            col: 0,
        }
    } else {
        CursorTarget::InComponent {
            line: line_idx + 1,
            component: right_cursor.0.min(merged_right.len() - 1),
            offset: right_cursor.1,
            bias: Bias::KeepLeft,
        }
    };
    let right_line = if merged_right.is_empty() {
        Line::Empty
    } else {
        Line::content(merged_right)
    };

    Ok(PendingEdit {
        first: line_idx,
        last: line_idx + 1,
        replacement: vec![left_line, right_line],
        cursor,
    })
}

/// Backward delete at line start: fold this line onto the end of the
/// previous one.
pub fn merge_with_previous(
    doc: &Document,
    line_idx: usize,
    fmt: &dyn Formatter,
) -> Result<PendingEdit, EditError> {
    if line_idx == 0 {
        return Err(EditError::NoLineBefore);
    }
    let prev = doc.line(line_idx - 1).ok_or(EditError::Internal)?;
    let cur = doc.line(line_idx).ok_or(EditError::InvalidPosition)?;

    match (prev, cur) {
        (Line::Content(prev), Line::Content(cur)) => {
            let (merged, cursor) = join_content(prev, cur, line_idx - 1, fmt)?;
            Ok(PendingEdit {
                first: line_idx - 1,
                last: line_idx + 1,
                replacement: vec![merged],
                cursor,
            })
        }
        (Line::Empty, Line::Content(cur)) => Ok(PendingEdit {
            first: line_idx - 1,
            last: line_idx + 1,
            replacement: vec![Line::Content(cur.clone())],
            cursor: CursorTarget::Column {
                line: line_idx - 1,
                col: 0,
            },
        }),
        (Line::Content(prev), Line::Empty) => {
            let cursor = end_of_content(prev, line_idx - 1);
            Ok(PendingEdit {
                first: line_idx - 1,
                last: line_idx + 1,
                replacement: vec![Line::Content(prev.clone())],
                cursor,
            })
        }
        (Line::Empty, Line::Empty) => Ok(PendingEdit {
            first: line_idx - 1,
            last: line_idx + 1,
            replacement: vec![Line::Empty],
            cursor: CursorTarget::LineStart { line: line_idx - 1 },
        }),
        _ => Err(EditError::CrossesLineBreak),
    }
}

/// Forward delete at line end: fold the next line onto this one.
pub fn merge_with_next(
    doc: &Document,
    line_idx: usize,
    fmt: &dyn Formatter,
) -> Result<PendingEdit, EditError> {
    let cur = doc.line(line_idx).ok_or(EditError::InvalidPosition)?;
    let next = doc.line_after(line_idx).ok_or(EditError::NoLineAfter)?;

    match (cur, next) {
        (Line::Content(cur), Line::Content(next)) => {
            let (merged, cursor) = join_content(cur, next, line_idx, fmt)?;
            Ok(PendingEdit {
                first: line_idx,
                last: line_idx + 2,
                replacement: vec![merged],
                cursor,
            })
        }
        (Line::Content(cur), Line::Empty) => {
            let cursor = end_of_content(cur, line_idx);
            Ok(PendingEdit {
                first: line_idx,
                last: line_idx + 2,
                replacement: vec![Line::Content(cur.clone())],
                cursor,
            })
        }
        (Line::Empty, other) => Ok(PendingEdit {
            first: line_idx,
            last: line_idx + 2,
            replacement: vec![other.clone()],
            cursor: CursorTarget::Column {
                line: line_idx,
                col: 0,
            },
        }),
        _ => Err(EditError::CrossesLineBreak),
    }
}

/// Concatenate two content lines, attempting to merge the abutting
/// components, and place the cursor at the junction.
fn join_content(
    left: &ContentLine,
    right: &ContentLine,
    target_line: usize,
    fmt: &dyn Formatter,
) -> Result<(Line, CursorTarget), EditError> {
    let mut merged = left.clone();
    merged.invalidate_layout();
    let junction = merged.components.len();
    let mut tail = right.components.clone();
    for comp in &mut tail {
        comp.invalidate_render();
    }
    merged.components.extend(tail);

    let allowed = merged.allowed_kinds();
    let mut cursor = if junction < merged.components.len() {
        CursorTarget::InComponent {
            line: target_line,
            component: junction,
            offset: ContentOffset::ZERO,
            bias: Bias::KeepLeft,
        }
    } else {
        match junction.checked_sub(1) {
            Some(last) => CursorTarget::InComponent {
                line: target_line,
                component: last,
                offset: ContentOffset::new(merged.components[last].len()),
                bias: Bias::KeepLeft,
            },
            None => CursorTarget::LineStart { line: target_line },
        }
    };

    if junction > 0 && junction < merged.components.len() {
        let abutting = merged.components[junction].clone();
        if let Some(result) = merged.components[junction - 1].try_merge(&abutting, allowed, fmt) {
            merged.components.remove(junction);
            cursor = CursorTarget::InComponent {
                line: target_line,
                component: junction - 1,
                offset: result.left_len,
                bias: Bias::KeepLeft,
            };
        }
    }

    if merged.components.is_empty() {
        return Ok((Line::Empty, CursorTarget::LineStart { line: target_line }));
    }
    Ok((Line::Content(merged), cursor))
}

fn end_of_content(content: &ContentLine, line: usize) -> CursorTarget {
    match content.components.len().checked_sub(1) {
        Some(last) => CursorTarget::InComponent {
            line,
            component: last,
            offset: ContentOffset::new(content.components[last].len()),
            bias: Bias::KeepLeft,
        },
        None => CursorTarget::LineStart { line },
    }
}

/// Title lines edit their bracketed label as plain text.
fn edit_title(
    line_idx: usize,
    title: &TitleLine,
    sel: RenderBounds,
    text: &str,
) -> Result<PendingEdit, EditError> {
    if text.contains('\n') {
        return Err(EditError::InvalidPosition);
    }
    let label_len = char_count(&title.label);
    // Columns: 0 is '[', 1..=label_len the label, label_len + 1 is ']'.
    let clamp = |col: usize| col.clamp(1, label_len + 1) - 1;
    let (from, to) = (clamp(sel.start), clamp(sel.after.max(sel.start)));

    let mut label = remove_chars(&title.label, from, to);
    label = insert_chars(&label, from, text);

    if label.is_empty() {
        return Ok(PendingEdit::replace_line(
            line_idx,
            Line::Empty,
            CursorTarget::LineStart { line: line_idx },
        ));
    }
    let cursor = CursorTarget::Column {
        line: line_idx,
        col: 1 + from + char_count(text),
    };
    Ok(PendingEdit::replace_line(
        line_idx,
        Line::Title(TitleLine::new(label)),
        cursor,
    ))
}

fn delete_in_title(
    doc: &Document,
    ctx: &EditContext,
    title: &TitleLine,
    fmt: &dyn Formatter,
) -> Result<PendingEdit, EditError> {
    let sel = ctx.selection;
    let width = char_count(&title.label) + 2;

    if sel.is_empty() {
        match ctx.direction {
            EditDirection::Backward => {
                if sel.start == 0 {
                    return merge_with_previous(doc, ctx.line, fmt);
                }
                let range = RenderBounds::new(sel.start - 1, sel.start);
                edit_title(ctx.line, title, range, "")
            }
            EditDirection::Forward => {
                if sel.start >= width {
                    return merge_with_next(doc, ctx.line, fmt);
                }
                let range = RenderBounds::new(sel.start, sel.start + 1);
                edit_title(ctx.line, title, range, "")
            }
        }
    } else {
        edit_title(ctx.line, title, sel, "")
    }
}
