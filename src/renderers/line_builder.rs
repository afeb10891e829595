//! Display projection for content lines
//!
//! Builds the content track and the annotation track in lock-step from
//! a component sequence. Whenever an attachment needs more width than
//! the text under it, a virtual filler run keeps the two tracks
//! column-aligned; a zero-width break point at the start of every
//! annotated component gives offset conversion a synchronization
//! anchor even across components with no visible annotation.
//!
//! The resulting `LineLayout` is the bridge between the two coordinate
//! systems: content offsets to display columns (`display_offset`, with
//! a keep-left/keep-right policy at virtual boundaries) and display
//! columns back to content positions (`content_position`, which tags
//! columns inside filler runs as virtual).

use serde::{Deserialize, Serialize};

use super::track::{ElementRole, Track, TrackBuilder, TrackElement};
use crate::format::Formatter;
use crate::models::component::Component;
use crate::models::offset::{Bias, ContentOffset, ContentPosition, RenderBounds};
use crate::utils::grapheme::{char_count, char_slice};

/// Rendered span of one attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentBounds {
    pub component: usize,
    pub attachment: usize,
    pub bounds: RenderBounds,
}

/// The rendered form of a content line.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineLayout {
    pub content: Track,

    /// `None` when the line has no attachments and the formatter
    /// suppresses the empty track.
    pub annotation: Option<Track>,

    /// Per-component spans in the content track, parallel to the
    /// component list.
    pub components: Vec<RenderBounds>,

    /// Spans of every non-empty attachment in the annotation track.
    pub attachments: Vec<AttachmentBounds>,

    /// Formatter identity this layout was built with.
    pub version: u64,
}

impl LineLayout {
    /// Build the layout for a component sequence.
    pub fn build(components: &[Component], fmt: &dyn Formatter) -> LineLayout {
        let mut content = TrackBuilder::new();
        let mut annotation = TrackBuilder::new();
        let mut bounds = Vec::with_capacity(components.len());
        let mut att_bounds = Vec::new();
        let mut has_attachments = false;
        let mut prev: Option<&Component> = None;

        for (i, comp) in components.iter().enumerate() {
            if content.width() > 0 && fmt.space_before(prev, comp) {
                content.push_spacing(1);
            }
            let start = content.width();
            let rendered = fmt.render_component(comp);

            let active: Vec<usize> = comp
                .attachments
                .iter()
                .enumerate()
                .filter(|(_, a)| !a.is_empty())
                .map(|(k, _)| k)
                .collect();

            if active.is_empty() {
                content.push_content(i, ContentOffset::ZERO, &rendered);
            } else {
                has_attachments = true;
                // Synchronization anchor for offset conversion.
                content.push_break(i);
                annotation.push_break(i);

                let len = char_count(&rendered);
                let first_off = comp.attachments[active[0]].offset.clamp_to(len).value();
                if first_off > 0 {
                    content.push_content(i, ContentOffset::ZERO, char_slice(&rendered, 0, first_off));
                }

                for (k, &ai) in active.iter().enumerate() {
                    let att = &comp.attachments[ai];
                    let att_off = att.offset.clamp_to(len).value();
                    let next_off = active
                        .get(k + 1)
                        .map(|&n| comp.attachments[n].offset.clamp_to(len).value())
                        .unwrap_or(len);

                    // The annotation must start no earlier than the
                    // content column it anchors to.
                    if annotation.width() < content.width() {
                        annotation.push_spacing(content.width() - annotation.width());
                    }
                    // The previous annotation may have run ahead of the
                    // text; keep the cursor able to land there.
                    if content.width() < annotation.width() {
                        content.push_filler(i, annotation.width() - content.width(), fmt.filler_glyph());
                    }

                    let att_start = annotation.width();
                    annotation.push_annotation(i, ai, &fmt.render_attachment(att));
                    att_bounds.push(AttachmentBounds {
                        component: i,
                        attachment: ai,
                        bounds: RenderBounds::new(att_start, annotation.width()),
                    });

                    if next_off > att_off {
                        content.push_content(
                            i,
                            ContentOffset::new(att_off),
                            char_slice(&rendered, att_off, next_off),
                        );
                    }
                }
            }

            bounds.push(RenderBounds::new(start, content.width()));
            prev = Some(comp);
        }

        if fmt.pad_track_ends() {
            if annotation.width() < content.width() {
                annotation.push_padding(content.width() - annotation.width());
            } else if content.width() < annotation.width() {
                content.push_padding(annotation.width() - content.width());
            }
        }

        let annotation = if has_attachments || !fmt.hide_empty_annotation_track() {
            Some(annotation.finish())
        } else {
            None
        };

        LineLayout {
            content: content.finish(),
            annotation,
            components: bounds,
            attachments: att_bounds,
            version: fmt.version(),
        }
    }

    /// Display width of the content track.
    pub fn width(&self) -> usize {
        self.content.width
    }

    /// Convert a display column to a content position.
    ///
    /// Finds the last element whose start is at or before `col`; a
    /// residual inside a virtual element yields
    /// `ContentPosition::Virtual` rather than a real offset.
    pub fn content_position(&self, col: usize) -> (Option<usize>, ContentPosition) {
        let el = match self.content.element_before(col) {
            Some(el) => el,
            None => return (None, ContentPosition::Real(ContentOffset::ZERO)),
        };
        let residual = col - el.start;
        match el.role {
            ElementRole::Content => {
                let offset = el.content_offset.unwrap_or(ContentOffset::ZERO);
                (el.component, ContentPosition::Real(offset + residual.min(el.width)))
            }
            // A break is the real start of its component.
            ElementRole::Break => (el.component, ContentPosition::Real(ContentOffset::ZERO)),
            _ => (el.component, ContentPosition::Virtual(residual.min(el.width))),
        }
    }

    /// Convert a content offset within a component to a display
    /// column.
    ///
    /// At boundaries that touch virtual elements the `bias` decides
    /// which side of the zero-width/filler run the column lands on.
    pub fn display_offset(&self, component: usize, offset: ContentOffset, bias: Bias) -> Option<usize> {
        let els: Vec<&TrackElement> = self
            .content
            .elements
            .iter()
            .filter(|el| el.role == ElementRole::Content && el.component == Some(component))
            .collect();

        if els.is_empty() {
            return self.components.get(component).map(|b| b.start);
        }

        let len = els
            .iter()
            .map(|el| el.content_offset.unwrap_or(ContentOffset::ZERO).value() + el.width)
            .max()
            .unwrap_or(0);
        let at = offset.clamp_to(len).value();

        // Strict interior of an element: unambiguous.
        for el in &els {
            let o = el.content_offset.unwrap_or(ContentOffset::ZERO).value();
            if at > o && at < o + el.width {
                return Some(el.start + (at - o));
            }
        }

        let left = els
            .iter()
            .rev()
            .find(|el| el.content_offset.unwrap_or(ContentOffset::ZERO).value() + el.width == at)
            .map(|el| el.start + el.width);
        let right = els
            .iter()
            .find(|el| el.content_offset.unwrap_or(ContentOffset::ZERO).value() == at)
            .map(|el| el.start);

        match bias {
            Bias::KeepLeft => left.or(right),
            Bias::KeepRight => right.or(left),
        }
    }

    /// Rendered bounds of the attachment anchored at `offset` on
    /// `component`, if it rendered.
    pub fn attachment_span(&self, component: usize, attachment: usize) -> Option<RenderBounds> {
        self.attachments
            .iter()
            .find(|a| a.component == component && a.attachment == attachment)
            .map(|a| a.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SheetFormatter;
    use crate::models::component::Attachment;

    fn fmt() -> SheetFormatter {
        SheetFormatter::default()
    }

    fn word_with_chord(word: &str, chord: &str, at: usize) -> Component {
        let mut comp = Component::word(word);
        comp.push_attachment(Attachment::chord(chord, ContentOffset::new(at)));
        comp
    }

    #[test]
    fn plain_words_render_without_annotation_track() {
        let comps = vec![
            Component::word("hello"),
            Component::space(" "),
            Component::word("world"),
        ];
        let layout = LineLayout::build(&comps, &fmt());
        assert_eq!(layout.content.text(), "hello world");
        assert!(layout.annotation.is_none());
    }

    #[test]
    fn wide_chord_inserts_filler_before_next_annotation() {
        // "Amaj7" over "go", then "D" over "on": the second chord
        // cannot start before its anchor, so the first chord pushes a
        // filler run into the content track.
        let comps = vec![
            word_with_chord("go", "Amaj7", 0),
            word_with_chord("on", "D", 0),
        ];
        let layout = LineLayout::build(&comps, &fmt());
        let annotation = layout.annotation.as_ref().expect("attachments present");
        assert_eq!(annotation.text(), "Amaj7D");
        assert_eq!(layout.content.text(), "go --on");
        for col in [2, 3, 4] {
            let (_, pos) = layout.content_position(col);
            assert!(pos.is_virtual(), "column {col} is spacing or filler");
        }
        let span = layout.attachment_span(1, 0).unwrap();
        assert_eq!(span, RenderBounds::new(5, 6), "D sits above its anchor");
    }

    #[test]
    fn annotation_waits_for_its_anchor_column() {
        // Chord anchored mid-word: the annotation track is padded so
        // the chord starts above its anchor character.
        let comps = vec![word_with_chord("goodbye", "E7", 4)];
        let layout = LineLayout::build(&comps, &fmt());
        let annotation = layout.annotation.as_ref().unwrap();
        assert_eq!(layout.content.text(), "goodbye");
        assert_eq!(annotation.text(), "    E7");
        let span = layout.attachment_span(0, 0).unwrap();
        assert_eq!(span, RenderBounds::new(4, 6));
    }

    #[test]
    fn offset_conversion_round_trips_on_real_columns() {
        let comps = vec![word_with_chord("go", "Am7", 0), word_with_chord("on", "D", 0)];
        let layout = LineLayout::build(&comps, &fmt());
        for col in 0..layout.width() {
            let (comp, pos) = layout.content_position(col);
            if let ContentPosition::Real(offset) = pos {
                let back = layout
                    .display_offset(comp.unwrap(), offset, Bias::KeepRight)
                    .unwrap();
                assert_eq!(back, col, "round trip at column {col}");
            }
        }
    }

    #[test]
    fn keep_left_and_keep_right_disagree_across_virtual_columns() {
        // End of "go" and start of "on" are adjacent content positions
        // separated by virtual columns; the bias picks the side.
        let comps = vec![
            word_with_chord("go", "Amaj7", 0),
            word_with_chord("on", "D", 0),
        ];
        let layout = LineLayout::build(&comps, &fmt());
        let left = layout
            .display_offset(0, ContentOffset::new(2), Bias::KeepLeft)
            .unwrap();
        let right = layout
            .display_offset(1, ContentOffset::new(0), Bias::KeepRight)
            .unwrap();
        assert_eq!(left, 2);
        assert_eq!(right, 5);
    }
}
