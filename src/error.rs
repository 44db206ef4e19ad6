use thiserror::Error;

// ---------------------------------------------------------------------------
// Core error type
// ---------------------------------------------------------------------------

/// Failures raised by the normalizer, the query builder and the board.
///
/// None of these are transient: the same inputs always fail the same way, so
/// callers report them and never retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    /// No known naming convention supplies a required column.
    #[error("missing required column `{column}` (source columns: {available:?})")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// A season or probability cell could not be interpreted.
    #[error("row {row}: column `{column}` holds `{value}`, expected {expected}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },

    /// The data contradicts the scale declared for the probability column.
    #[error("row {row}: column `{column}` is declared {scale} scale but holds {value}")]
    ScaleMismatch {
        row: usize,
        column: String,
        scale: &'static str,
        value: f64,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// The two error kinds surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Schema,
    InvalidParameter,
}

impl BoardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BoardError::MissingColumn { .. }
            | BoardError::InvalidValue { .. }
            | BoardError::ScaleMismatch { .. } => ErrorKind::Schema,
            BoardError::InvalidParameter(_) => ErrorKind::InvalidParameter,
        }
    }

    pub(crate) fn invalid_parameter(msg: impl Into<String>) -> Self {
        BoardError::InvalidParameter(msg.into())
    }
}

pub type Result<T, E = BoardError> = std::result::Result<T, E>;
