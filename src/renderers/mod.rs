//! Display projection
//!
//! Turns the component model into aligned character tracks and tab
//! lines into per-string rows. Everything here is derived data,
//! rebuilt whenever the model or the formatter identity changes.

pub mod line_builder;
pub mod tab_grid;
pub mod track;

pub use line_builder::{AttachmentBounds, LineLayout};
pub use tab_grid::TabGrid;
pub use track::{ElementRole, Track, TrackElement};
