//! Edit-specific error types.

use thiserror::Error;

use crate::document::{Position, SelectionSpan};

#[derive(Debug, Error)]
pub enum EditError {
    #[error("position {position} out of bounds: {detail}")]
    OutOfBounds { position: Position, detail: String },

    #[error("formatter returned no text for fragment {index} (selection has {required} fragments)")]
    MissingReplacement { index: usize, required: usize },

    #[error("selection {next} overlaps or precedes selection {previous}")]
    OverlappingSelections {
        previous: SelectionSpan,
        next: SelectionSpan,
    },

    #[error("selection {next} starts on the line where selection {previous} ends")]
    SameLineSelections {
        previous: SelectionSpan,
        next: SelectionSpan,
    },

    #[error("formatter failed: {0}")]
    Formatter(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl EditError {
    pub(crate) fn line_out_of_bounds(position: Position, line_count: usize) -> Self {
        Self::OutOfBounds {
            position,
            detail: format!("document has {line_count} lines"),
        }
    }

    pub(crate) fn column_out_of_bounds(position: Position, line_len: usize) -> Self {
        Self::OutOfBounds {
            position,
            detail: format!("line {} has {line_len} columns", position.line),
        }
    }

    pub(crate) fn formatter<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Formatter(Box::new(err))
    }
}

pub type EditResult<T> = Result<T, EditError>;
