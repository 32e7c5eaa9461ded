//! Error types for library loading and mapping

use thiserror::Error;

/// Errors raised while decoding a library index blob
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LibraryError {
    /// The blob ends before the structure it describes
    #[error("library blob is truncated: expected {expected} more bytes at offset {offset}")]
    Truncated {
        /// Byte offset of the read that failed
        offset: usize,
        /// Number of bytes requested
        expected: usize,
    },

    /// The blob does not start with the expected magic word
    #[error("not a cell library blob (magic word {found:#010x})")]
    BadMagic {
        /// Magic word found at the start of the blob
        found: u32,
    },

    /// The blob was written by an incompatible version
    #[error("unsupported library blob version {found}, expected {expected}")]
    BadVersion {
        /// Version found in the blob
        found: u32,
        /// Version supported by this build
        expected: u32,
    },

    /// The blob is well-framed but its content is inconsistent
    #[error("malformed library blob: {0}")]
    Malformed(String),

    /// The blob could not be read
    #[error("cannot read library blob: {0}")]
    Io(String),
}

impl From<std::io::Error> for LibraryError {
    fn from(e: std::io::Error) -> Self {
        LibraryError::Io(e.to_string())
    }
}

/// Errors raised by the technology mapper
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    /// No pattern or fallback covers a node in a required polarity
    #[error("no cover for {node} ({polarity}): {reason}")]
    NoMatch {
        /// Description of the subject node
        node: String,
        /// Polarity that could not be produced
        polarity: &'static str,
        /// Missing library capability
        reason: String,
    },

    /// No sequential cell provides the controls a register needs
    #[error("no sequential cell compatible with register {node}: {reason}")]
    SequentialCompatibility {
        /// Description of the subject register
        node: String,
        /// Missing library capability
        reason: String,
    },
}

/// Result of library loading
pub type LibraryResult<T> = Result<T, LibraryError>;

/// Result of technology mapping
pub type MapResult<T> = Result<T, MapError>;
