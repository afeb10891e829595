//! Song Sheet Editor WASM Module
//!
//! Core engine for component-based song sheet editing: lyric lines
//! with chords anchored above specific characters, offset-precise edit
//! operations, and synchronized tablature grids.

pub mod edit;
pub mod format;
pub mod models;
pub mod parse;
pub mod renderers;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use models::component::*;
pub use models::line::*;
pub use models::offset::*;
pub use models::tabline::*;

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(feature = "console_log")]
    console_log::init_with_level(log::Level::Debug).expect("failed to initialize logger");

    log::info!("Song Sheet Editor WASM module initialized");
}
