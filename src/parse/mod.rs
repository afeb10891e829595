//! Parsing for raw tablature input
//!
//! Content-line parsing lives behind the formatter; this module covers
//! the tab side: per-string tokenization and the multi-stream column
//! alignment used both when assembling pasted tab input and when
//! rebuilding the render grid.

pub mod tab;

pub use tab::{align, align_strings, tokenize, AlignedTab, TabToken};
