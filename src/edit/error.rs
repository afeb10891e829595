//! Typed edit failure reasons
//!
//! Errors are values surfaced to the UI layer as a closed reason set;
//! the only open-ended variant is `Internal`, a logic-error signal for
//! states the engine believes unreachable.

use serde::Serialize;
use thiserror::Error;

/// Why an edit was refused. The line is untouched in every case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize)]
pub enum EditError {
    #[error("no component found at the edit position")]
    NoComponent,

    #[error("position does not map to editable content")]
    InvalidPosition,

    #[error("no line before this one")]
    NoLineBefore,

    #[error("no line after this one")]
    NoLineAfter,

    #[error("cannot delete across a line break")]
    CrossesLineBreak,

    #[error("cannot partially edit overlapping attachments")]
    PartialAttachment,

    #[error("an attachment already exists at the target offset")]
    AttachmentExists,

    #[error("bar lines cannot be edited")]
    BarLine,

    #[error("content of this type is not allowed here")]
    TypeNotAllowed,

    #[error("edit reached an unexpected state")]
    Internal,
}

/// Why raw tablature input could not be aligned.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
pub enum TabParseError {
    #[error("bar lines are not aligned across strings")]
    BarUnaligned,

    #[error("strings ended at different lengths")]
    RaggedStreams,

    #[error("invalid tablature character {0:?}")]
    InvalidToken(char),

    #[error("fret number out of range: {0}")]
    FretTooLarge(String),
}
