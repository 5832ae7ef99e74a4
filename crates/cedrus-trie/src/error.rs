//! Error types for trie operations.

use std::fmt;

/// Result type alias for trie operations.
pub type Result<T> = std::result::Result<T, TrieError>;

/// Error type for trie operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    /// Value handle out of the permissible range for its slot.
    InvalidValue,
    /// Empty key, or a key walk produced a degenerate result.
    InvalidKey,
    /// The requested path is not present in the trie.
    NoPath,
    /// The node exists but carries no value.
    NoValue,
    /// I/O error while saving or loading.
    Io(String),
    /// Malformed or unsupported serialized image.
    Format(String),
}

impl fmt::Display for TrieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrieError::InvalidValue => write!(f, "invalid value"),
            TrieError::InvalidKey => write!(f, "invalid key"),
            TrieError::NoPath => write!(f, "no path"),
            TrieError::NoValue => write!(f, "no value"),
            TrieError::Io(msg) => write!(f, "I/O error: {}", msg),
            TrieError::Format(msg) => write!(f, "format error: {}", msg),
        }
    }
}

impl std::error::Error for TrieError {}

impl From<std::io::Error> for TrieError {
    fn from(err: std::io::Error) -> Self {
        TrieError::Io(err.to_string())
    }
}
