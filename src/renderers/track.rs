//! Display track model
//!
//! A rendered line is one or two tracks of fixed-width columns. Each
//! track is an ordered list of elements; elements are either *real*
//! (they map back to content or attachment offsets) or *virtual*
//! (filler runs, zero-width break points, policy spacing, end padding)
//! and exist only to keep sibling tracks column-aligned.

use serde::{Deserialize, Serialize};

use crate::models::offset::{ContentOffset, RenderBounds};

/// Role of a rendered element within its track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementRole {
    /// Real text from a component's content.
    Content,
    /// An attachment's own rendering in the annotation track.
    Annotation,
    /// Spacing decided by the formatter's space-before policy.
    Spacing,
    /// Virtual filler keeping the content track under a wide
    /// annotation; the cursor can land here without touching content.
    Filler,
    /// Zero-width synchronization marker.
    Break,
    /// End-of-line padding.
    Padding,
}

/// One rendered element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackElement {
    pub text: String,

    /// Starting column within the track.
    pub start: usize,

    /// Width in columns; zero only for `Break`.
    pub width: usize,

    pub role: ElementRole,

    /// Index of the component this element was rendered from.
    pub component: Option<usize>,

    /// For `Content`: the content offset of the element's first column.
    pub content_offset: Option<ContentOffset>,

    /// For `Annotation`: index into the component's attachment list.
    pub attachment: Option<usize>,
}

impl TrackElement {
    /// Virtual elements own no content offsets.
    pub fn is_virtual(&self) -> bool {
        matches!(
            self.role,
            ElementRole::Spacing | ElementRole::Filler | ElementRole::Break | ElementRole::Padding
        )
    }

    pub fn bounds(&self) -> RenderBounds {
        RenderBounds::new(self.start, self.start + self.width)
    }

    /// Content offset just past this element's content, for `Content`
    /// elements.
    pub fn content_end(&self) -> Option<ContentOffset> {
        self.content_offset.map(|o| o + self.width)
    }
}

/// A finished display track.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub elements: Vec<TrackElement>,
    pub width: usize,
}

impl Track {
    /// The track's rendered text.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.width);
        for el in &self.elements {
            out.push_str(&el.text);
        }
        out
    }

    /// The element occupying column `col`, if any. Zero-width elements
    /// never occupy a column.
    pub fn element_at(&self, col: usize) -> Option<&TrackElement> {
        self.elements
            .iter()
            .find(|el| el.width > 0 && el.start <= col && col < el.start + el.width)
    }

    /// The last element whose start is at or before `col`.
    pub fn element_before(&self, col: usize) -> Option<&TrackElement> {
        self.elements.iter().rev().find(|el| el.start <= col)
    }
}

/// Incremental track construction; widths accumulate as elements are
/// pushed.
#[derive(Debug, Default)]
pub struct TrackBuilder {
    elements: Vec<TrackElement>,
    width: usize,
}

impl TrackBuilder {
    pub fn new() -> Self {
        TrackBuilder::default()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    fn push(&mut self, mut el: TrackElement) {
        el.start = self.width;
        self.width += el.width;
        self.elements.push(el);
    }

    pub fn push_content(&mut self, component: usize, offset: ContentOffset, text: &str) {
        if text.is_empty() {
            return;
        }
        let width = text.chars().count();
        self.push(TrackElement {
            text: text.to_string(),
            start: 0,
            width,
            role: ElementRole::Content,
            component: Some(component),
            content_offset: Some(offset),
            attachment: None,
        });
    }

    pub fn push_annotation(&mut self, component: usize, attachment: usize, text: &str) {
        let width = text.chars().count();
        self.push(TrackElement {
            text: text.to_string(),
            start: 0,
            width,
            role: ElementRole::Annotation,
            component: Some(component),
            content_offset: None,
            attachment: Some(attachment),
        });
    }

    pub fn push_spacing(&mut self, width: usize) {
        if width == 0 {
            return;
        }
        self.push(TrackElement {
            text: " ".repeat(width),
            start: 0,
            width,
            role: ElementRole::Spacing,
            component: None,
            content_offset: None,
            attachment: None,
        });
    }

    pub fn push_filler(&mut self, component: usize, width: usize, glyph: char) {
        if width == 0 {
            return;
        }
        self.push(TrackElement {
            text: glyph.to_string().repeat(width),
            start: 0,
            width,
            role: ElementRole::Filler,
            component: Some(component),
            content_offset: None,
            attachment: None,
        });
    }

    pub fn push_break(&mut self, component: usize) {
        self.push(TrackElement {
            text: String::new(),
            start: 0,
            width: 0,
            role: ElementRole::Break,
            component: Some(component),
            content_offset: None,
            attachment: None,
        });
    }

    pub fn push_padding(&mut self, width: usize) {
        if width == 0 {
            return;
        }
        self.push(TrackElement {
            text: " ".repeat(width),
            start: 0,
            width,
            role: ElementRole::Padding,
            component: None,
            content_offset: None,
            attachment: None,
        });
    }

    pub fn finish(self) -> Track {
        Track {
            elements: self.elements,
            width: self.width,
        }
    }
}
