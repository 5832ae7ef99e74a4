//! Error types for the matcher.
//!
//! Trie-level conditions are wrapped transparently; the matcher adds the
//! lifecycle and resource kinds of its own.

use thiserror::Error;

pub use cedrus_trie::TrieError;

/// Main error type for matcher operations.
#[derive(Error, Debug)]
pub enum MatchError {
    /// Error from the underlying trie.
    #[error(transparent)]
    Trie(#[from] TrieError),

    /// A scan was attempted before the matcher was compiled.
    #[error("matcher is not compiled")]
    NotCompiled,

    /// A mutation was attempted after the matcher was compiled.
    #[error("matcher is already compiled")]
    AlreadyCompiled,

    /// The match buffer would outgrow its configured cap.
    #[error("match buffer exceeded its cap of {0} positions")]
    TooLarge(usize),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for matcher operations.
pub type Result<T> = std::result::Result<T, MatchError>;
