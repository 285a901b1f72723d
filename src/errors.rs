use thiserror::Error;

/// Everything the turtle engine can refuse to do. Harmless but meaningless
/// calls (undo on an empty buffer, a degenerate fill, clearing a stamp that
/// is already gone) are silent no-ops and never show up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TurtleError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown shape: {0}")]
    UnknownShape(String),

    #[error("bad shape transform matrix: must not be singular")]
    SingularMatrix,

    #[error("bad color: {0}")]
    BadColor(String),

    #[error("unknown speed: {0}")]
    UnknownSpeed(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<csscolorparser::ParseColorError> for TurtleError {
    fn from(error: csscolorparser::ParseColorError) -> Self {
        TurtleError::BadColor(error.to_string())
    }
}

impl From<ron::error::SpannedError> for TurtleError {
    fn from(error: ron::error::SpannedError) -> Self {
        TurtleError::Config(error.to_string())
    }
}
