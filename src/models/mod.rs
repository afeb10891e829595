//! Data models for the song sheet editor
//!
//! The component/attachment model, the offset value types, the line
//! collection, and the tablature grid model.

pub mod component;
pub mod line;
pub mod offset;
pub mod tabline;

// Re-export commonly used types
pub use component::{
    AllowedKinds, Attachment, AttachmentKind, Component, ComponentKind, MergeResult,
};
pub use line::{ContentLine, Document, Line, TitleLine};
pub use offset::{Bias, ContentOffset, ContentPosition, RenderBounds};
pub use tabline::{TabColumn, TabGeometry, TabLine};
