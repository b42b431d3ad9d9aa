//! Error types for the spigot engine.
//!
//! Running out of precision and running out of input are not errors: the
//! engine handles the first by folding in another source matrix and reports
//! the second as [`Pull::Exhausted`](crate::Pull::Exhausted). What remains
//! here is malformed expressions, malformed input streams and I/O.

use thiserror::Error;

/// Result type alias for spigot operations.
pub type SpigotResult<T> = Result<T, SpigotError>;

/// Errors that can occur while building or running a spigot.
#[derive(Debug, Error)]
pub enum SpigotError {
    /// A source name referenced in an expression is not registered.
    #[error("unrecognised source '{name}'")]
    UnknownSource { name: String },

    /// A source or operator ran out of arguments.
    #[error("'{source_name}' requires {expected}")]
    MissingArgument {
        source_name: String,
        expected: String,
    },

    /// A numeric argument could not be parsed.
    #[error("invalid number '{text}': {reason}")]
    InvalidNumber { text: String, reason: String },

    /// A numeric argument parsed but lies outside the source's domain.
    #[error("'{source_name}': {reason}")]
    Domain { source_name: String, reason: String },

    /// Tokens remained after a complete expression.
    #[error("unexpected extra argument '{text}'")]
    UnexpectedArgument { text: String },

    /// More than one consumer asked for the external input channel.
    #[error("'{source_name}' needs standard input, which is already in use")]
    InputAlreadyClaimed { source_name: String },

    /// A line read from an external input stream is not an integer.
    #[error("malformed input line '{line}': {reason}")]
    MalformedInput { line: String, reason: String },

    /// I/O error while reading input or writing output.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpigotError {
    /// True when this error is a closed downstream pipe.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, SpigotError::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }

    pub(crate) fn missing(source_name: &str, expected: impl Into<String>) -> Self {
        SpigotError::MissingArgument {
            source_name: source_name.to_string(),
            expected: expected.into(),
        }
    }

    pub(crate) fn domain(source_name: &str, reason: impl Into<String>) -> Self {
        SpigotError::Domain {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_number(text: &str, reason: impl Into<String>) -> Self {
        SpigotError::InvalidNumber {
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}
