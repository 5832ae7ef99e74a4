//! Scan responses and the pooled scratch buffers behind them.
//!
//! Every scan records `(position, node)` pairs into a [`MatchBuf`] taken
//! from a process-wide LIFO pool, so repeated scans do not allocate.
//! The buffer goes back to the pool when the [`Response`] is released or
//! dropped.

use std::mem;
use std::sync::Mutex;

use crate::matcher::Matcher;

/// Buffers kept around between scans.
const POOL_KEEP: usize = 32;

static BUF_POOL: Mutex<Vec<MatchBuf>> = Mutex::new(Vec::new());

/// A recorded accepting position: the byte index in the text and the
/// automaton node that accepted there.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MatchAt {
    pub at: usize,
    pub out_id: i32,
}

/// Reusable scratch buffer of recorded positions plus a read cursor.
#[derive(Debug, Default)]
pub(crate) struct MatchBuf {
    pub at: Vec<MatchAt>,
    pub next: usize,
}

impl MatchBuf {
    fn reset(&mut self) {
        self.at.clear();
        self.next = 0;
    }
}

/// Takes a buffer from the pool (or makes one) with at least `initial`
/// capacity.
pub(crate) fn acquire(initial: usize) -> MatchBuf {
    let mut buf = match BUF_POOL.lock() {
        Ok(mut pool) => pool.pop().unwrap_or_default(),
        Err(_) => MatchBuf::default(),
    };
    buf.reset();
    buf.at.reserve(initial);
    buf
}

/// Returns a buffer to the pool, unless the pool is already full.
pub(crate) fn release(mut buf: MatchBuf) {
    buf.reset();
    if let Ok(mut pool) = BUF_POOL.lock() {
        if pool.len() < POOL_KEEP {
            pool.push(buf);
        }
    }
}

/// One matched pattern occurrence.
///
/// `at` is the byte index of the last matched byte, `klen` the key
/// length; the matched slice of the text is
/// `text[at + 1 - klen .. at + 1]` (see [`Matcher::key_of`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchToken<'m, V> {
    /// Length of the matched key in bytes.
    pub klen: usize,
    /// Byte index of the last matched byte in the scanned text.
    pub at: usize,
    /// The payload stored with the key.
    pub value: &'m V,
    /// Reserved for external ranking layers; always 0 here.
    pub freq: u32,
}

/// The result of one [`Matcher::scan`] call.
///
/// Holds the recorded accepting positions and enumerates the tokens at
/// each position on demand by following the matcher's output chains.
pub struct Response<'m, V> {
    matcher: &'m Matcher<V>,
    buf: MatchBuf,
}

impl<'m, V> Response<'m, V> {
    pub(crate) fn new(matcher: &'m Matcher<V>, buf: MatchBuf) -> Self {
        Response { matcher, buf }
    }

    /// Whether any recorded positions remain to be enumerated.
    pub fn has_next(&self) -> bool {
        self.buf.next < self.buf.at.len()
    }

    /// Emits the tokens of the next recorded position, following the
    /// output chain of the accepting node. The list may be empty when
    /// the chain holds only structural entries.
    pub fn next_match_item(&mut self) -> Vec<MatchToken<'m, V>> {
        let mut tokens = Vec::new();
        if !self.has_next() {
            return tokens;
        }
        let at = self.buf.at[self.buf.next];
        self.buf.next += 1;

        let m = self.matcher;
        let mut oid = at.out_id;
        loop {
            let out = m.output(oid);
            if let Some(entry) = m.trie().value_entry(out.vkey) {
                if entry.len > 0 {
                    tokens.push(MatchToken {
                        klen: entry.len,
                        at: at.at,
                        value: &entry.value,
                        freq: 0,
                    });
                }
            }
            match out.link {
                link if link >= 0 => oid = link,
                _ => break,
            }
        }
        tokens
    }

    /// Returns the scratch buffer to the pool. Dropping the response
    /// does the same; this form just makes the hand-back explicit.
    pub fn release(self) {}
}

impl<V> Drop for Response<'_, V> {
    fn drop(&mut self) {
        release(mem::take(&mut self.buf));
    }
}
