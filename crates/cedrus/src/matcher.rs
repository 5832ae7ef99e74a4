//! The Aho–Corasick matcher: compile-time fail/output construction and
//! the scan loop.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use cedrus_trie::{dump, Trie, ROOT};

use crate::config::MatcherConfig;
use crate::error::{MatchError, Result};
use crate::response::{self, MatchAt, MatchToken, Response};

/// A node's overlay entry: the id of the next suffix-accepting node (or
/// -1), and the cached value handle for token emission (or -1).
#[derive(Debug, Clone, Copy)]
pub(crate) struct OutNode {
    pub link: i32,
    pub vkey: i32,
}

impl Default for OutNode {
    fn default() -> Self {
        OutNode { link: -1, vkey: -1 }
    }
}

/// A multi-pattern matcher over a double-array trie.
///
/// Usage follows a strict lifecycle: insert patterns, [`compile`] once,
/// then [`scan`] any number of times. A compiled matcher is read-only
/// and can be shared across threads; each thread drives its own
/// [`Response`].
///
/// [`compile`]: Matcher::compile
/// [`scan`]: Matcher::scan
pub struct Matcher<V> {
    trie: Trie<V>,
    fails: Vec<i32>,
    outputs: Vec<OutNode>,
    compiled: bool,
    config: MatcherConfig,
}

impl<V> Matcher<V> {
    /// Creates an empty matcher with default configuration.
    pub fn new() -> Self {
        Self::with_config(MatcherConfig::default())
    }

    /// Creates an empty matcher with the given configuration.
    pub fn with_config(config: MatcherConfig) -> Self {
        Self::from_trie_with_config(Trie::new(), config)
    }

    /// Wraps an existing (for example, freshly loaded) trie in an
    /// uncompiled matcher.
    pub fn from_trie(trie: Trie<V>) -> Self {
        Self::from_trie_with_config(trie, MatcherConfig::default())
    }

    fn from_trie_with_config(trie: Trie<V>, config: MatcherConfig) -> Self {
        Matcher {
            trie,
            fails: Vec::new(),
            outputs: Vec::new(),
            compiled: false,
            config,
        }
    }

    /// The underlying trie, for dictionary-level queries.
    pub fn trie(&self) -> &Trie<V> {
        &self.trie
    }

    pub(crate) fn output(&self, id: i32) -> OutNode {
        self.outputs[id as usize]
    }

    /// The fail link of node `id` after compilation, if the node was
    /// reached by the builder. Mostly useful for diagnostics.
    pub fn fail_of(&self, id: i32) -> Option<i32> {
        match self.fails.get(id as usize) {
            Some(&fid) if fid >= 0 => Some(fid),
            _ => None,
        }
    }

    /// Inserts a pattern with its payload. Fails with
    /// [`MatchError::AlreadyCompiled`] once the matcher is compiled.
    pub fn insert(&mut self, key: impl AsRef<[u8]>, value: V) -> Result<()> {
        if self.compiled {
            return Err(MatchError::AlreadyCompiled);
        }
        self.trie.insert(key.as_ref(), value)?;
        Ok(())
    }

    /// Removes a pattern. Fails with [`MatchError::AlreadyCompiled`]
    /// once the matcher is compiled.
    pub fn delete(&mut self, key: impl AsRef<[u8]>) -> Result<()> {
        if self.compiled {
            return Err(MatchError::AlreadyCompiled);
        }
        self.trie.delete(key.as_ref())?;
        Ok(())
    }

    /// Compiles the automaton: computes the fail link of every node by
    /// breadth-first traversal, then merges output chains so every node
    /// reaches the accepting states of all its proper suffixes. A second
    /// call is a no-op.
    pub fn compile(&mut self) {
        if self.compiled {
            return;
        }
        let n = self.trie.capacity();
        self.fails = vec![-1; n];
        self.outputs = vec![OutNode::default(); n];
        self.fails[ROOT as usize] = ROOT;
        self.build_fails();
        self.build_outputs();
        self.compiled = true;

        let status = self.trie.status();
        tracing::debug!(
            keys = status.keys,
            nodes = status.nodes,
            slots = n,
            "compiled automaton"
        );
    }

    fn build_fails(&mut self) {
        let mut queue = VecDeque::new();
        for c in self.trie.childs(ROOT) {
            self.fails[c.id as usize] = ROOT;
            queue.push_back(c);
        }
        while let Some(desc) = queue.pop_front() {
            let nid = desc.id;
            if self.trie.is_end(nid) {
                if let Ok(vk) = self.trie.vkey_of(nid) {
                    self.outputs[nid as usize].vkey = vk;
                }
            }
            for c in self.trie.childs(nid) {
                queue.push_back(c);
                // climb the fail chain to the deepest suffix that can
                // consume this label
                let mut fid = nid;
                while fid != ROOT {
                    let fs = self.fails[fid as usize];
                    if let Ok(to) = self.trie.child(fs, c.label) {
                        fid = to;
                        break;
                    }
                    fid = self.fails[fid as usize];
                }
                self.fails[c.id as usize] = fid;
            }
        }
    }

    fn build_outputs(&mut self) {
        for nid in 0..self.fails.len() {
            let fid = self.fails[nid];
            if fid < 0 || !self.trie.is_end(fid) {
                continue;
            }
            self.trie.mark_end(nid as i32);
            self.outputs[nid].link = fid;
        }
    }

    /// Scans `text` and returns a [`Response`] holding every accepting
    /// position. Tokens are pulled from the response on demand.
    ///
    /// Fails with [`MatchError::NotCompiled`] before [`compile`], and
    /// with [`MatchError::TooLarge`] if the text produces more accepting
    /// positions than the configured buffer cap.
    ///
    /// [`compile`]: Matcher::compile
    pub fn scan(&self, text: &[u8]) -> Result<Response<'_, V>> {
        if !self.compiled {
            return Err(MatchError::NotCompiled);
        }
        let mut buf = response::acquire(self.config.match_buffer_size);
        let mut nid = ROOT;
        for (i, &b) in text.iter().enumerate() {
            loop {
                if let Ok(to) = self.trie.child(nid, b) {
                    nid = to;
                    if self.trie.is_end(nid) {
                        if buf.at.len() >= self.config.max_match_buffer {
                            response::release(buf);
                            return Err(MatchError::TooLarge(self.config.max_match_buffer));
                        }
                        buf.at.push(MatchAt { at: i, out_id: nid });
                    }
                    break;
                }
                if nid == ROOT {
                    break;
                }
                nid = match self.fails[nid as usize] {
                    fid if fid >= 0 => fid,
                    _ => ROOT,
                };
            }
        }
        Ok(Response::new(self, buf))
    }

    /// Slices the matched key of `token` out of the scanned text.
    pub fn key_of<'t>(&self, text: &'t [u8], token: &MatchToken<'_, V>) -> &'t [u8] {
        &text[token.at + 1 - token.klen..token.at + 1]
    }

    /// Writes the compiled automaton as a Graphviz file: black labelled
    /// trie edges plus red `(*)` fail edges.
    pub fn dump_graph<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = String::new();
        dump::write_header(&mut out);
        self.trie.write_trie(&mut out);
        for (id, &fid) in self.fails.iter().enumerate() {
            if fid != -1 {
                dump::write_fail_edge(&mut out, id as i32, fid);
            }
        }
        dump::write_finish(&mut out);
        fs::write(path, out)?;
        Ok(())
    }
}

impl<V> Default for Matcher<V> {
    fn default() -> Self {
        Self::new()
    }
}
