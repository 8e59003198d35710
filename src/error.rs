//! Error types for the kinarow crate

use thiserror::Error;

/// Main error type for the kinarow crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("unknown opponent '{name}'. Expected one of: {expected}")]
    UnknownOpponent { name: String, expected: String },

    #[error("board string has {got} cells, expected {expected} in '{context}'")]
    InvalidBoardString {
        expected: usize,
        got: usize,
        context: String,
    },

    #[error("invalid character '{character}' at cell {position} in '{context}'")]
    InvalidCellCharacter {
        character: char,
        position: usize,
        context: String,
    },

    #[error("invalid piece counts: X={x_count}, O={o_count} (X moves first)")]
    InvalidPieceCounts { x_count: usize, o_count: usize },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to encode model snapshot: {0}")]
    SnapshotEncode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode model snapshot: {0}")]
    SnapshotDecode(#[from] rmp_serde::decode::Error),

    #[error("unsupported snapshot format version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("snapshot was trained on a {found}x{found} board, agent expects {expected}x{expected}")]
    BoardSizeMismatch { found: usize, expected: usize },

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            operation: operation.into(),
            source,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
