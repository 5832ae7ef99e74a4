//! Compact double-array trie with payload values.
//!
//! This crate implements the storage layer of the cedrus matcher: a
//! double-array trie that keeps the whole dictionary in two parallel
//! arrays plus a block allocator, giving constant-time labelled edge
//! traversal and a very small memory footprint.
//!
//! # Representation
//!
//! Every node is a `(value, check)` pair of signed 32-bit integers:
//!
//! - a **free** slot has `check < 0`; `value`/`check` then encode the
//!   slot's neighbours in the containing block's circular free list
//!   (negated indices),
//! - a **branch** has `check >= 0` and `value < 0`; `!value` is the
//!   node's *base*, and the child reached over byte `label` lives at
//!   slot `base ^ label`,
//! - a **terminal** has `check >= 0` and `value >= 0`; `value` is a
//!   handle into the value table.
//!
//! A node that is both a branch and a terminal plants a marker child at
//! label 0, so the branch keeps its base while the value lives at
//! `base ^ 0`.
//!
//! Slots are carved out of 256-slot blocks kept on three rings (full,
//! closed, open) by occupancy; see [`Trie`] for the operations.
//!
//! # Example
//!
//! ```rust
//! use cedrus_trie::Trie;
//!
//! let mut trie = Trie::new();
//! trie.insert(b"west", 1u32)?;
//! trie.insert(b"western", 2u32)?;
//! assert_eq!(trie.get(b"west")?, &1);
//!
//! // keys extending "west", in key order
//! let ids = trie.prefix_predict(b"west", 0);
//! assert_eq!(ids.len(), 2);
//! # Ok::<(), cedrus_trie::TrieError>(())
//! ```

#![warn(missing_docs)]

mod blocks;
pub mod dump;
mod error;
mod node;
mod query;
mod serial;
mod trie;
pub mod validation;

pub use error::{Result, TrieError};
pub use node::NodeDesc;
pub use query::TrieStatus;
pub use serial::{TrieFormat, FORMAT_MAGIC, FORMAT_VERSION};
pub use trie::{Trie, ValueEntry, ROOT};
