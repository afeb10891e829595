//! Component and attachment model
//!
//! A line of a song sheet is an ordered sequence of components (words,
//! spaces, chords, fingerings, rhythm patterns, punctuation). Each
//! component may carry attachments: secondary content such as a chord
//! hovering over part of a lyric, anchored at a content offset inside
//! the component's own value.
//!
//! The four editing operations (`try_remove_content`,
//! `try_replace_content`, `try_merge`, `split_end`) are the whole
//! structural contract: they are all-or-nothing, type-aware through the
//! formatter, and keep the attachment list consistent across splits and
//! merges.

use serde::{Deserialize, Serialize};

use super::offset::{ContentOffset, RenderBounds};
use crate::format::Formatter;
use crate::utils::grapheme::{char_count, char_slice, remove_chars};

/// Closed set of component variants.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Lyric or free text.
    Word = 0,
    /// Run of literal whitespace.
    Space = 1,
    /// Punctuation singleton (`,`, `.`, `!`, ...).
    Punctuation = 2,
    /// Chord symbol standing on its own in the content track.
    Chord = 3,
    /// Fingering run (digits, `pima`).
    Fingering = 4,
    /// Rhythm stroke pattern (`d`, `u`, `x`, `.`).
    Rhythm = 5,
}

impl ComponentKind {
    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Plain-text kinds stay legal on a line that carries attachments.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            ComponentKind::Word | ComponentKind::Space | ComponentKind::Punctuation
        )
    }
}

/// Bit set of component kinds a line currently accepts.
///
/// Once any component on a line has an attachment, new content is
/// restricted to plain text; nesting annotated content under further
/// annotations is not representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedKinds(u8);

impl AllowedKinds {
    pub const NONE: AllowedKinds = AllowedKinds(0);

    /// Every kind.
    pub fn all() -> AllowedKinds {
        AllowedKinds(
            ComponentKind::Word.bit()
                | ComponentKind::Space.bit()
                | ComponentKind::Punctuation.bit()
                | ComponentKind::Chord.bit()
                | ComponentKind::Fingering.bit()
                | ComponentKind::Rhythm.bit(),
        )
    }

    /// Word, space, and punctuation only.
    pub fn text_only() -> AllowedKinds {
        AllowedKinds(
            ComponentKind::Word.bit()
                | ComponentKind::Space.bit()
                | ComponentKind::Punctuation.bit(),
        )
    }

    pub fn contains(self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= kind.bit();
    }
}

/// What an attachment holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentKind {
    Chord,
    Text,
}

/// Secondary content anchored at a content offset inside its owning
/// component's value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub value: String,

    /// Anchor position within the owning component's content.
    /// `ContentOffset::FAR_END` anchors past the last character.
    pub offset: ContentOffset,

    /// Rendered span in the annotation track, valid until the next
    /// structural mutation of the owning line.
    #[serde(skip)]
    pub render: Option<RenderBounds>,
}

impl Attachment {
    pub fn new(kind: AttachmentKind, value: impl Into<String>, offset: ContentOffset) -> Self {
        Attachment {
            kind,
            value: value.into(),
            offset,
            render: None,
        }
    }

    pub fn chord(value: impl Into<String>, offset: ContentOffset) -> Self {
        Attachment::new(AttachmentKind::Chord, value, offset)
    }

    pub fn text(value: impl Into<String>, offset: ContentOffset) -> Self {
        Attachment::new(AttachmentKind::Text, value, offset)
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Value returned by a successful `try_merge`.
///
/// `left_len` is the content length the left operand had before the
/// merge; callers use it to rebase attachment offsets and to place the
/// cursor at the junction.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeResult {
    pub value: String,
    pub left_len: ContentOffset,
}

/// One unit of a line's content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub kind: ComponentKind,

    /// Semantic content, not yet rendered.
    pub value: String,

    /// Kept sorted by offset. Duplicate offsets may exist transiently
    /// after parsing; edit operations never leave two non-empty
    /// attachments on the same offset.
    pub attachments: Vec<Attachment>,

    /// Rendered span in the content track, valid until the next
    /// structural mutation of the owning line.
    #[serde(skip)]
    pub render: Option<RenderBounds>,
}

impl Component {
    pub fn new(kind: ComponentKind, value: impl Into<String>) -> Self {
        Component {
            kind,
            value: value.into(),
            attachments: Vec::new(),
            render: None,
        }
    }

    pub fn word(value: impl Into<String>) -> Self {
        Component::new(ComponentKind::Word, value)
    }

    pub fn space(value: impl Into<String>) -> Self {
        Component::new(ComponentKind::Space, value)
    }

    pub fn punctuation(value: impl Into<String>) -> Self {
        Component::new(ComponentKind::Punctuation, value)
    }

    pub fn chord(value: impl Into<String>) -> Self {
        Component::new(ComponentKind::Chord, value)
    }

    /// Content length in characters.
    pub fn len(&self) -> usize {
        char_count(&self.value)
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn has_attachments(&self) -> bool {
        self.attachments.iter().any(|a| !a.is_empty())
    }

    /// Drop every cached render span (component and attachments).
    pub fn invalidate_render(&mut self) {
        self.render = None;
        for att in &mut self.attachments {
            att.render = None;
        }
    }

    fn sort_attachments(&mut self) {
        self.attachments.sort_by_key(|a| a.offset);
    }

    /// Index of the non-empty attachment anchored exactly at `offset`.
    pub fn attachment_at(&self, offset: ContentOffset) -> Option<usize> {
        self.attachments
            .iter()
            .position(|a| a.offset == offset && !a.is_empty())
    }

    /// Add an attachment without an occupancy check. Used at parse
    /// time, where duplicate offsets are tolerated.
    pub fn push_attachment(&mut self, att: Attachment) {
        self.attachments.push(att);
        self.sort_attachments();
        self.invalidate_render();
    }

    /// Add an attachment, refusing a second non-empty attachment on
    /// the same offset. Used by edit operations.
    pub fn try_attach(&mut self, att: Attachment) -> bool {
        if !att.is_empty() && self.attachment_at(att.offset).is_some() {
            return false;
        }
        self.push_attachment(att);
        true
    }

    /// Detach the attachment at list index `index`.
    pub fn detach(&mut self, index: usize) -> Attachment {
        let att = self.attachments.remove(index);
        self.invalidate_render();
        att
    }

    /// Remove `len` characters of content starting at `offset`.
    ///
    /// All-or-nothing: if the remaining text no longer classifies to an
    /// allowed kind, nothing changes and `false` is returned.
    /// Attachments anchored strictly inside the removed span go with
    /// their text; anchors at or after the span end shift left.
    pub fn try_remove_content(
        &mut self,
        offset: ContentOffset,
        len: usize,
        allowed: AllowedKinds,
        fmt: &dyn Formatter,
    ) -> bool {
        let total = self.len();
        let start = offset.clamp_to(total).value();
        let end = (start + len).min(total);
        if start >= end {
            return true;
        }

        let new_value = remove_chars(&self.value, start, end);
        let new_kind = if new_value.is_empty() {
            self.kind
        } else {
            match fmt.classify(&new_value, allowed) {
                Some(kind) => kind,
                None => return false,
            }
        };

        let removed = end - start;
        let mut kept: Vec<Attachment> = Vec::with_capacity(self.attachments.len());
        for att in self.attachments.drain(..) {
            let at = att.offset.clamp_to(total).value();
            if at > start && at < end {
                continue;
            }
            let mut att = att;
            if !att.offset.is_far_end() && at >= end {
                att.offset = att.offset - removed;
            }
            // A shift can land on a surviving anchor; the earlier one wins.
            let collides = !att.is_empty()
                && kept
                    .iter()
                    .any(|k| !k.is_empty() && k.offset == att.offset);
            if !collides {
                kept.push(att);
            }
        }

        self.value = new_value;
        self.kind = new_kind;
        self.attachments = kept;
        self.sort_attachments();
        self.invalidate_render();
        true
    }

    /// Replace the whole content value, keeping attachments anchored by
    /// clamping their offsets to the new length.
    pub fn try_replace_content(
        &mut self,
        new_value: &str,
        allowed: AllowedKinds,
        fmt: &dyn Formatter,
    ) -> bool {
        if !new_value.is_empty() {
            match fmt.classify(new_value, allowed) {
                Some(kind) => self.kind = kind,
                None => return false,
            }
        }
        self.value = new_value.to_string();
        let len = self.len();
        for att in &mut self.attachments {
            if !att.offset.is_far_end() {
                att.offset = att.offset.clamp_to(len);
            }
        }
        self.invalidate_render();
        true
    }

    /// Merge `next` onto the end of this component.
    ///
    /// Returns `None` when the combined content does not classify to an
    /// allowed kind (type mismatch); the component is untouched then.
    /// On success `next`'s attachments are carried over with their
    /// offsets shifted by this component's former length.
    pub fn try_merge(
        &mut self,
        next: &Component,
        allowed: AllowedKinds,
        fmt: &dyn Formatter,
    ) -> Option<MergeResult> {
        let combined = format!("{}{}", self.value, next.value);
        let kind = if combined.is_empty() {
            self.kind
        } else {
            fmt.classify(&combined, allowed)?
        };

        let left_len = self.len();
        self.value = combined;
        self.kind = kind;
        for att in &next.attachments {
            let mut att = att.clone();
            if att.offset.is_far_end() {
                // Re-anchor at the precise junction so it survives
                // later splits of the merged component.
                att.offset = ContentOffset::new(left_len) + char_count(&next.value);
            } else {
                att.offset = att.offset + left_len;
            }
            att.render = None;
            self.attachments.push(att);
        }
        self.sort_attachments();
        self.invalidate_render();

        Some(MergeResult {
            value: self.value.clone(),
            left_len: ContentOffset::new(left_len),
        })
    }

    /// Carve the component in two at `offset`; `self` keeps the head.
    ///
    /// Every attachment with offset >= `offset` moves to the returned
    /// tail, rebased to be relative to it.
    pub fn split_end(&mut self, offset: ContentOffset) -> Component {
        let total = self.len();
        let at = offset.clamp_to(total).value();

        let tail_value = char_slice(&self.value, at, total).to_string();
        let head_value = char_slice(&self.value, 0, at).to_string();

        let mut tail_atts = Vec::new();
        let mut head_atts = Vec::new();
        for att in self.attachments.drain(..) {
            if att.offset.clamp_to(total).value() >= at {
                let mut att = att;
                if !att.offset.is_far_end() {
                    att.offset = att.offset - at;
                }
                att.render = None;
                tail_atts.push(att);
            } else {
                head_atts.push(att);
            }
        }

        self.value = head_value;
        self.attachments = head_atts;
        self.invalidate_render();

        Component {
            kind: self.kind,
            value: tail_value,
            attachments: tail_atts,
            render: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SheetFormatter;

    fn fmt() -> SheetFormatter {
        SheetFormatter::default()
    }

    #[test]
    fn split_end_rebases_tail_attachments() {
        let mut comp = Component::word("goodbye");
        comp.push_attachment(Attachment::chord("Am", ContentOffset::new(0)));
        comp.push_attachment(Attachment::chord("E7", ContentOffset::new(4)));

        let tail = comp.split_end(ContentOffset::new(4));

        assert_eq!(comp.value, "good");
        assert_eq!(tail.value, "bye");
        assert_eq!(comp.attachments.len(), 1);
        assert_eq!(comp.attachments[0].offset, ContentOffset::new(0));
        assert_eq!(tail.attachments.len(), 1);
        assert_eq!(tail.attachments[0].offset, ContentOffset::new(0));
        assert_eq!(tail.attachments[0].value, "E7");
    }

    #[test]
    fn merge_shifts_right_operand_attachments() {
        let mut left = Component::word("good");
        let mut right = Component::word("bye");
        right.push_attachment(Attachment::chord("E7", ContentOffset::new(0)));

        let result = left
            .try_merge(&right, AllowedKinds::all(), &fmt())
            .expect("plain words must merge");

        assert_eq!(result.value, "goodbye");
        assert_eq!(result.left_len, ContentOffset::new(4));
        assert_eq!(left.attachments.len(), 1);
        assert_eq!(left.attachments[0].offset, ContentOffset::new(4));
    }

    #[test]
    fn split_then_merge_round_trips() {
        let mut comp = Component::word("halleluja");
        comp.push_attachment(Attachment::chord("C", ContentOffset::new(0)));
        comp.push_attachment(Attachment::chord("G", ContentOffset::new(3)));
        comp.push_attachment(Attachment::chord("F", ContentOffset::new(6)));
        let original = comp.clone();

        let tail = comp.split_end(ContentOffset::new(3));
        comp.try_merge(&tail, AllowedKinds::all(), &fmt())
            .expect("halves of a word must merge back");

        assert_eq!(comp, original);
    }

    #[test]
    fn remove_content_is_all_or_nothing() {
        let mut comp = Component::chord("Am7");
        let before = comp.clone();

        // Stripping the root would leave "m7", which is not a chord
        // and not anything else chord-only lines accept.
        let removed = comp.try_remove_content(
            ContentOffset::new(0),
            1,
            AllowedKinds(ComponentKind::Chord.bit()),
            &fmt(),
        );

        assert!(!removed);
        assert_eq!(comp, before);
    }

    #[test]
    fn remove_content_shifts_and_drops_attachments() {
        let mut comp = Component::word("singing");
        comp.push_attachment(Attachment::chord("C", ContentOffset::new(1)));
        comp.push_attachment(Attachment::chord("G", ContentOffset::new(4)));
        comp.push_attachment(Attachment::chord("F", ContentOffset::new(5)));

        // Remove "ngi" -> "sing"; the anchor inside the span dies, the
        // later one shifts left.
        assert!(comp.try_remove_content(ContentOffset::new(2), 3, AllowedKinds::all(), &fmt()));
        assert_eq!(comp.value, "sing");
        let kept: Vec<_> = comp
            .attachments
            .iter()
            .map(|a| (a.value.as_str(), a.offset.value()))
            .collect();
        assert_eq!(kept, vec![("C", 1), ("F", 2)]);
    }

    #[test]
    fn attach_rejects_occupied_offset() {
        let mut comp = Component::word("road");
        assert!(comp.try_attach(Attachment::chord("D", ContentOffset::new(2))));
        assert!(!comp.try_attach(Attachment::chord("A", ContentOffset::new(2))));
        assert_eq!(comp.attachments.len(), 1);
    }

    #[test]
    fn replace_content_reclassifies_and_clamps_anchors() {
        let mut comp = Component::word("travelling");
        comp.push_attachment(Attachment::chord("Em", ContentOffset::new(7)));

        assert!(comp.try_replace_content("far", AllowedKinds::all(), &fmt()));
        assert_eq!(comp.kind, ComponentKind::Word);
        assert_eq!(comp.attachments[0].offset, ContentOffset::new(3));

        // A replacement that no longer fits any allowed kind is refused.
        let before = comp.clone();
        assert!(!comp.try_replace_content("a b", AllowedKinds::all(), &fmt()));
        assert_eq!(comp, before);
    }
}
