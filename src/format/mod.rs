//! Formatter capability
//!
//! The engine never decides on its own how content looks: rendering
//! widths, text classification, inter-component spacing, and track
//! suppression all go through the `Formatter` trait. The engine treats
//! the formatter as an immutable value per render pass; layout caches
//! store its `version` and rebuild when it changes.
//!
//! `SheetFormatter` is the crate's implementation: fixed-width
//! rendering (one column per character) with a hand-rolled chord
//! symbol matcher.

use once_cell::sync::Lazy;
use std::collections::BTreeSet;

use crate::models::component::{
    AllowedKinds, Attachment, AttachmentKind, Component, ComponentKind,
};
use crate::utils::grapheme::char_count;

/// Pluggable formatting and parsing policy.
pub trait Formatter {
    /// Rendered text of a component's content.
    fn render_component(&self, component: &Component) -> String {
        component.value.clone()
    }

    /// Rendered text of an attachment.
    fn render_attachment(&self, att: &Attachment) -> String {
        att.value.clone()
    }

    /// Display width of rendered text, in columns.
    fn width(&self, text: &str) -> usize {
        char_count(text)
    }

    /// Classify a span of input text into a component kind, honoring
    /// the allowed-kind mask. `None` means the text cannot legally
    /// become a single component here.
    fn classify(&self, text: &str, allowed: AllowedKinds) -> Option<ComponentKind>;

    /// Parse inserted text into a component sequence.
    fn parse_components(&self, text: &str, allowed: AllowedKinds) -> Vec<Component>;

    /// Decide what kind of attachment a span of input text becomes.
    fn classify_attachment(&self, text: &str) -> AttachmentKind;

    /// Whether a spacing column belongs before `next` given the
    /// component to its left.
    fn space_before(&self, prev: Option<&Component>, next: &Component) -> bool;

    /// Suppress an annotation track that holds no attachments.
    fn hide_empty_annotation_track(&self) -> bool {
        true
    }

    /// Pad the shorter track to the longest sibling at end of line.
    fn pad_track_ends(&self) -> bool {
        false
    }

    /// Glyph used for virtual filler runs in the content track.
    fn filler_glyph(&self) -> char {
        '-'
    }

    /// Identity counter for layout-cache invalidation.
    fn version(&self) -> u64;
}

/// Characters legal in a chord symbol after the root and accidental.
static CHORD_TAIL: Lazy<BTreeSet<char>> = Lazy::new(|| {
    let mut set: BTreeSet<char> = "majMinsudgo0123456789+#b°Δ".chars().collect();
    set.insert('-');
    set
});

/// Characters that form rhythm stroke patterns.
static RHYTHM_STROKES: Lazy<BTreeSet<char>> =
    Lazy::new(|| "DUX↓↑x".chars().collect());

/// Default formatter used by the API layer and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetFormatter {
    version: u64,
    pad_tracks: bool,
}

impl Default for SheetFormatter {
    fn default() -> Self {
        SheetFormatter {
            version: 0,
            pad_tracks: false,
        }
    }
}

impl SheetFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A distinct formatter identity, forcing layout rebuilds.
    pub fn with_version(version: u64) -> Self {
        SheetFormatter {
            version,
            pad_tracks: false,
        }
    }

    pub fn padded(mut self) -> Self {
        self.pad_tracks = true;
        self.version += 1;
        self
    }

    /// Whether `text` reads as a chord symbol: root `A`-`G`, optional
    /// accidental, quality/extension tail, optional slash bass.
    pub fn is_chord_symbol(text: &str) -> bool {
        fn root_ok(part: &str) -> Option<&str> {
            let mut chars = part.char_indices();
            let (_, root) = chars.next()?;
            if !('A'..='G').contains(&root) {
                return None;
            }
            let rest = &part[root.len_utf8()..];
            Some(
                rest.strip_prefix(|c| c == '#' || c == 'b')
                    .unwrap_or(rest),
            )
        }

        let (head, bass) = match text.split_once('/') {
            Some((head, bass)) => (head, Some(bass)),
            None => (text, None),
        };
        let tail = match root_ok(head) {
            Some(tail) => tail,
            None => return false,
        };
        if !tail.chars().all(|c| CHORD_TAIL.contains(&c)) {
            return false;
        }
        match bass {
            Some(bass) => matches!(root_ok(bass), Some(rest) if rest.is_empty()),
            None => true,
        }
    }

    fn is_word(text: &str) -> bool {
        !text.is_empty()
            && text
                .chars()
                .all(|c| c.is_alphanumeric() || c == '\'' || c == '-' || c == '_')
    }

    fn is_fingering(text: &str) -> bool {
        !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
    }

    fn is_rhythm(text: &str) -> bool {
        !text.is_empty() && text.chars().all(|c| RHYTHM_STROKES.contains(&c))
    }
}

impl Formatter for SheetFormatter {
    fn classify(&self, text: &str, allowed: AllowedKinds) -> Option<ComponentKind> {
        if text.is_empty() {
            return None;
        }
        if text.chars().all(char::is_whitespace) {
            return allowed
                .contains(ComponentKind::Space)
                .then_some(ComponentKind::Space);
        }
        if text.chars().any(char::is_whitespace) {
            // Mixed text and whitespace can never be one component.
            return None;
        }
        if allowed.contains(ComponentKind::Chord) && Self::is_chord_symbol(text) {
            return Some(ComponentKind::Chord);
        }
        if allowed.contains(ComponentKind::Fingering) && Self::is_fingering(text) {
            return Some(ComponentKind::Fingering);
        }
        if allowed.contains(ComponentKind::Rhythm) && Self::is_rhythm(text) {
            return Some(ComponentKind::Rhythm);
        }
        if allowed.contains(ComponentKind::Word) && Self::is_word(text) {
            return Some(ComponentKind::Word);
        }
        if allowed.contains(ComponentKind::Punctuation) && char_count(text) == 1 {
            if let Some(only) = text.chars().next() {
                if !only.is_alphanumeric() {
                    return Some(ComponentKind::Punctuation);
                }
            }
        }
        None
    }

    fn parse_components(&self, text: &str, allowed: AllowedKinds) -> Vec<Component> {
        let mut out: Vec<Component> = Vec::new();
        let mut run = String::new();
        let mut run_is_space = false;

        let mut flush = |run: &mut String, run_is_space: bool, out: &mut Vec<Component>| {
            if run.is_empty() {
                return;
            }
            let kind = if run_is_space {
                ComponentKind::Space
            } else {
                self.classify(run, allowed).unwrap_or(ComponentKind::Word)
            };
            out.push(Component::new(kind, run.clone()));
            run.clear();
        };

        for ch in text.chars() {
            if ch == '\n' || ch == '\r' {
                // Line splits are handled before parsing; stray control
                // characters act as separators.
                flush(&mut run, run_is_space, &mut out);
                continue;
            }
            let is_space = ch.is_whitespace();
            let is_punct = !is_space && !ch.is_alphanumeric() && !"'-_#/+°↓↑".contains(ch);
            if is_punct {
                flush(&mut run, run_is_space, &mut out);
                out.push(Component::punctuation(ch.to_string()));
                continue;
            }
            if !run.is_empty() && is_space != run_is_space {
                flush(&mut run, run_is_space, &mut out);
            }
            run_is_space = is_space;
            run.push(ch);
        }
        flush(&mut run, run_is_space, &mut out);
        out
    }

    fn classify_attachment(&self, text: &str) -> AttachmentKind {
        if Self::is_chord_symbol(text) {
            AttachmentKind::Chord
        } else {
            AttachmentKind::Text
        }
    }

    fn space_before(&self, prev: Option<&Component>, next: &Component) -> bool {
        let prev = match prev {
            Some(prev) => prev,
            None => return false,
        };
        if prev.kind == ComponentKind::Space || next.kind == ComponentKind::Space {
            return false;
        }
        // Punctuation hugs the word it follows.
        if next.kind == ComponentKind::Punctuation {
            return false;
        }
        true
    }

    fn pad_track_ends(&self) -> bool {
        self.pad_tracks
    }

    fn version(&self) -> u64 {
        self.version
    }
}
