//! Line model and document line collection
//!
//! A document is an ordered list of lines. A line is either annotated
//! content (the common case), a title, an empty placeholder, or a
//! tablature grid. Lines are created and destroyed only through the
//! document's splice primitive; edit engines prepare whole replacement
//! lines and commit them in one step.

use serde::{Deserialize, Serialize};

use super::component::{AllowedKinds, Component};
use super::tabline::TabLine;
use crate::format::Formatter;
use crate::renderers::line_builder::LineLayout;

/// Ordered component sequence plus its cached rendered form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentLine {
    pub components: Vec<Component>,

    /// Valid until the next structural mutation or a formatter change.
    #[serde(skip)]
    layout: Option<LineLayout>,
}

impl ContentLine {
    pub fn new(components: Vec<Component>) -> Self {
        ContentLine {
            components,
            layout: None,
        }
    }

    /// Component kinds this line currently accepts. Once any component
    /// carries an attachment, only plain text may be added.
    pub fn allowed_kinds(&self) -> AllowedKinds {
        if self.components.iter().any(Component::has_attachments) {
            AllowedKinds::text_only()
        } else {
            AllowedKinds::all()
        }
    }

    /// Whether the line has no content left at all.
    pub fn is_blank(&self) -> bool {
        self.components
            .iter()
            .all(|c| c.is_empty() && !c.has_attachments())
    }

    /// Drop the cached layout and every cached render span.
    pub fn invalidate_layout(&mut self) {
        self.layout = None;
        for comp in &mut self.components {
            comp.invalidate_render();
        }
    }

    /// Rebuild the layout unconditionally, writing render spans back
    /// into components and attachments.
    pub fn rebuild_layout(&mut self, fmt: &dyn Formatter) {
        let layout = LineLayout::build(&self.components, fmt);
        for (comp, bounds) in self.components.iter_mut().zip(&layout.components) {
            comp.render = Some(*bounds);
        }
        for ab in &layout.attachments {
            self.components[ab.component].attachments[ab.attachment].render = Some(ab.bounds);
        }
        self.layout = Some(layout);
    }

    /// The current layout, rebuilt lazily when missing or built with a
    /// different formatter identity.
    pub fn layout(&mut self, fmt: &dyn Formatter) -> &LineLayout {
        let stale = self
            .layout
            .as_ref()
            .map_or(true, |l| l.version != fmt.version());
        if stale {
            self.rebuild_layout(fmt);
        }
        self.layout.as_ref().expect("layout rebuilt above")
    }
}

/// A title line brackets a label between two marker components.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleLine {
    pub label: String,
}

impl TitleLine {
    pub fn new(label: impl Into<String>) -> Self {
        TitleLine {
            label: label.into(),
        }
    }

    /// The bracketing component sequence this title renders as.
    pub fn components(&self) -> Vec<Component> {
        vec![
            Component::punctuation("["),
            Component::word(self.label.clone()),
            Component::punctuation("]"),
        ]
    }
}

/// One line of a song sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Line {
    Content(ContentLine),
    Title(TitleLine),
    Empty,
    Tab(TabLine),
}

impl Line {
    pub fn content(components: Vec<Component>) -> Line {
        Line::Content(ContentLine::new(components))
    }

    pub fn as_content(&self) -> Option<&ContentLine> {
        match self {
            Line::Content(line) => Some(line),
            _ => None,
        }
    }

    pub fn as_content_mut(&mut self) -> Option<&mut ContentLine> {
        match self {
            Line::Content(line) => Some(line),
            _ => None,
        }
    }

    pub fn as_tab(&self) -> Option<&TabLine> {
        match self {
            Line::Tab(tab) => Some(tab),
            _ => None,
        }
    }

    pub fn is_empty_line(&self) -> bool {
        matches!(self, Line::Empty)
    }
}

/// Top-level container: owns line lifetime and ordering.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub lines: Vec<Line>,
}

impl Document {
    pub fn new() -> Self {
        Document { lines: Vec::new() }
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn line_mut(&mut self, index: usize) -> Option<&mut Line> {
        self.lines.get_mut(index)
    }

    pub fn line_before(&self, index: usize) -> Option<&Line> {
        index.checked_sub(1).and_then(|i| self.lines.get(i))
    }

    pub fn line_after(&self, index: usize) -> Option<&Line> {
        self.lines.get(index + 1)
    }

    /// Replace lines `[first, last)` with `replacement` in one step.
    /// This is the only way lines enter or leave the document.
    pub fn splice_lines(&mut self, first: usize, last: usize, replacement: Vec<Line>) {
        let last = last.min(self.lines.len());
        let first = first.min(last);
        self.lines.splice(first..last, replacement);
    }

    /// Serialize content and attachment offsets exactly.
    pub fn snapshot(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Rebuild a document from a snapshot.
    pub fn restore(json: &str) -> serde_json::Result<Document> {
        serde_json::from_str(json)
    }
}
