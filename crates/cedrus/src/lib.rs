//! Cedrus — multi-pattern string matching over a compact double-array
//! trie.
//!
//! Cedrus stores a dictionary of byte-string patterns, each paired with
//! an arbitrary payload, in a double-array trie, then layers an
//! Aho–Corasick automaton on top of it. A scan reports every occurrence
//! of every pattern in time linear in the text length plus the number of
//! reported matches, and pooled scratch buffers keep repeated scans
//! allocation-free.
//!
//! # Quick start
//!
//! ```rust
//! use cedrus::Matcher;
//!
//! let mut matcher = Matcher::new();
//! matcher.insert("he", 0u32)?;
//! matcher.insert("hers", 1u32)?;
//! matcher.compile();
//!
//! let text = b"ushers";
//! let mut resp = matcher.scan(text)?;
//! while resp.has_next() {
//!     for token in resp.next_match_item() {
//!         let key = matcher.key_of(text, &token);
//!         println!("{} -> {}", String::from_utf8_lossy(key), token.value);
//!     }
//! }
//! # Ok::<(), cedrus::MatchError>(())
//! ```
//!
//! # Lifecycle
//!
//! A matcher is built empty, filled with [`Matcher::insert`] (and
//! optionally pruned with [`Matcher::delete`]), then frozen with
//! [`Matcher::compile`]. Compiling twice is a no-op; mutating a compiled
//! matcher is an error. From compile onward the matcher is read-only and
//! can be shared across threads, each thread scanning with its own
//! [`Response`].
//!
//! Dictionary-level queries (exact lookup, prefix enumeration, key
//! reconstruction, persistence) are available on the underlying trie via
//! [`Matcher::trie`]; see the [`cedrus_trie`] crate.

#![warn(missing_docs)]

mod config;
mod error;
mod matcher;
mod response;

pub use config::{MatcherConfig, DEFAULT_MATCH_BUFFER_SIZE, DEFAULT_MAX_MATCH_BUFFER};
pub use error::{MatchError, Result};
pub use matcher::Matcher;
pub use response::{MatchToken, Response};

// Re-export the storage layer for dictionary-level use.
pub use cedrus_trie::{self as trie, NodeDesc, Trie, TrieError, TrieFormat, TrieStatus};
