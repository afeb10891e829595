//! Tablature grid rendering
//!
//! Renders a tab line into one text row per string: tuning gutter,
//! derived bar lines, and fret digits padded with the rest glyph to
//! each column's synchronized width.

use serde::{Deserialize, Serialize};

use crate::models::tabline::{TabGeometry, TabLine};

/// Rest/padding glyph within tab rows.
const REST: char = '-';

/// The rendered form of a tab line.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabGrid {
    /// One row per string, top string first.
    pub rows: Vec<String>,

    pub geometry: TabGeometry,
}

/// Render every string row of a tab line.
pub fn render(tab: &mut TabLine) -> TabGrid {
    let geometry = tab.geometry().clone();
    let strings = tab.string_count();
    let mut rows = Vec::with_capacity(strings);

    for string in 0..strings {
        let mut row = vec![REST; geometry.width];

        for slot in row.iter_mut().take(geometry.label_width) {
            *slot = ' ';
        }
        for (i, ch) in tab.tuning[string].chars().enumerate() {
            row[i] = ch;
        }
        for &bar in &geometry.bar_positions {
            row[bar] = '|';
        }

        for (index, bounds) in geometry.index_bounds.iter().enumerate() {
            let Some(column) = tab.columns.get(index).and_then(Option::as_ref) else {
                continue;
            };
            if let Some(fret) = column.notes.get(string).copied().flatten() {
                for (j, ch) in fret.to_string().chars().enumerate() {
                    row[bounds.start + j] = ch;
                }
            }
        }

        rows.push(row.into_iter().collect());
    }

    TabGrid { rows, geometry }
}
