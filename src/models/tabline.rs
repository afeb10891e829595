//! Tablature line model
//!
//! A tab line holds one tuning label per instrument string and a
//! sparse column list; each column carries at most one fret value per
//! string. Bar lines are derived from the configured bar length, never
//! stored, and the render-geometry caches (bar positions, per-column
//! render intervals) are rebuilt after every structural change.

use serde::{Deserialize, Serialize};

use super::offset::RenderBounds;
use crate::utils::grapheme::char_count;

/// One synchronized column: a fret per string, or rests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabColumn {
    pub notes: Vec<Option<u8>>,
}

impl TabColumn {
    pub fn new(strings: usize) -> Self {
        TabColumn {
            notes: vec![None; strings],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.iter().all(Option::is_none)
    }

    /// Render width: two columns as soon as any fret needs two digits.
    pub fn render_width(&self) -> usize {
        if self.notes.iter().any(|n| matches!(n, Some(f) if *f >= 10)) {
            2
        } else {
            1
        }
    }
}

/// Derived render geometry of a tab line.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabGeometry {
    /// Display columns holding a bar line.
    pub bar_positions: Vec<usize>,

    /// Render interval of each edit-space column index.
    pub index_bounds: Vec<RenderBounds>,

    /// Width of the tuning-label gutter (bar line excluded).
    pub label_width: usize,

    /// Total row width.
    pub width: usize,
}

/// A line holding a tablature grid instead of components.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabLine {
    /// Per-string tuning labels, top string first. Fixed length.
    pub tuning: Vec<String>,

    /// Sparse columns; `None` is a rest column for every string.
    pub columns: Vec<Option<TabColumn>>,

    /// Columns per measure; 0 means unbounded.
    pub bar_length: usize,

    #[serde(skip)]
    geometry: Option<TabGeometry>,
}

impl TabLine {
    pub fn new(tuning: Vec<String>) -> Self {
        TabLine {
            tuning,
            columns: Vec::new(),
            bar_length: 0,
            geometry: None,
        }
    }

    pub fn string_count(&self) -> usize {
        self.tuning.len()
    }

    pub fn is_blank(&self) -> bool {
        self.columns
            .iter()
            .all(|c| c.as_ref().map_or(true, TabColumn::is_empty))
    }

    pub fn invalidate(&mut self) {
        self.geometry = None;
    }

    /// Rebuilt lazily after any structural change.
    pub fn geometry(&mut self) -> &TabGeometry {
        if self.geometry.is_none() {
            self.geometry = Some(self.compute_geometry());
        }
        self.geometry.as_ref().expect("geometry computed above")
    }

    fn compute_geometry(&self) -> TabGeometry {
        let label_width = self
            .tuning
            .iter()
            .map(|t| char_count(t))
            .max()
            .unwrap_or(1)
            .max(1);

        let mut bar_positions = Vec::new();
        let mut index_bounds = Vec::with_capacity(self.columns.len());

        // Leading bar after the tuning gutter.
        let mut col = label_width;
        bar_positions.push(col);
        col += 1;

        for (i, column) in self.columns.iter().enumerate() {
            if self.bar_length > 0 && i > 0 && i % self.bar_length == 0 {
                bar_positions.push(col);
                col += 1;
            }
            let width = column.as_ref().map_or(1, TabColumn::render_width);
            index_bounds.push(RenderBounds::new(col, col + width));
            col += width;
        }

        if self.bar_length > 0 && !self.columns.is_empty() && self.columns.len() % self.bar_length == 0
        {
            bar_positions.push(col);
            col += 1;
        }

        TabGeometry {
            bar_positions,
            index_bounds,
            label_width,
            width: col,
        }
    }

    /// Set or extend the fret at (column, string). Typing a digit onto
    /// an existing single-digit fret concatenates (two-digit carry).
    pub fn set_note(&mut self, col: usize, string: usize, digit: u8) -> bool {
        if string >= self.string_count() || digit > 9 {
            return false;
        }
        if col >= self.columns.len() {
            self.columns.resize(col + 1, None);
        }
        let strings = self.string_count();
        let column = self.columns[col].get_or_insert_with(|| TabColumn::new(strings));
        let fret = &mut column.notes[string];
        *fret = Some(match *fret {
            Some(existing) if existing < 10 => existing * 10 + digit,
            _ => digit,
        });
        self.invalidate();
        true
    }

    /// Clear the fret at (column, string); empties collapse back into
    /// sparse rests and trailing rests are trimmed.
    pub fn clear_note(&mut self, col: usize, string: usize) -> bool {
        let Some(slot) = self.columns.get_mut(col) else {
            return false;
        };
        let Some(column) = slot.as_mut() else {
            return false;
        };
        if string >= column.notes.len() || column.notes[string].is_none() {
            return false;
        }
        column.notes[string] = None;
        if column.is_empty() {
            *slot = None;
        }
        self.trim_trailing_rests();
        self.invalidate();
        true
    }

    /// Remove edit-space columns `[first, last)`.
    pub fn delete_columns(&mut self, first: usize, last: usize) {
        let last = last.min(self.columns.len());
        let first = first.min(last);
        self.columns.drain(first..last);
        self.trim_trailing_rests();
        self.invalidate();
    }

    fn trim_trailing_rests(&mut self) {
        while matches!(self.columns.last(), Some(None)) {
            self.columns.pop();
        }
    }
}
