//! The double-array trie: construction and the insert path.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrieError};
use crate::node::{Block, Node, NodeInfo, VALUE_LIMIT};

/// Node id of the trie root.
pub const ROOT: i32 = 0;

/// A value-table entry: the byte length of the key it belongs to and the
/// caller's payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueEntry<V> {
    /// Length in bytes of the inserted key.
    pub len: usize,
    /// The payload stored with the key.
    pub value: V,
}

/// A double-array trie mapping byte-string keys to payload values.
///
/// Keys are arbitrary non-empty byte strings; byte 0 is reserved for the
/// internal terminal-marker edge and must not appear inside a key.
/// Sibling rings are kept sorted by label, so prefix enumeration yields
/// keys in byte order.
#[derive(Debug, Serialize, Deserialize)]
pub struct Trie<V> {
    pub(crate) array: Vec<Node>,
    pub(crate) infos: Vec<NodeInfo>,
    pub(crate) blocks: Vec<Block>,
    pub(crate) vals: Vec<Option<ValueEntry<V>>>,
    pub(crate) vkey: i32,
    /// Global lower-bound memo: `reject[n]` is the smallest group size
    /// known to be unplaceable in any block with `n` free slots.
    pub(crate) reject: Vec<i32>,
    pub(crate) bhead_f: i32,
    pub(crate) bhead_c: i32,
    pub(crate) bhead_o: i32,
    pub(crate) capacity: i32,
    pub(crate) size: i32,
    pub(crate) ordered: bool,
    pub(crate) max_trial: i32,
}

impl<V> Trie<V> {
    /// Creates an empty trie with one block.
    pub fn new() -> Self {
        let mut array = Vec::with_capacity(256);
        array.push(Node { value: -2, check: 0 });
        for i in 1..256i32 {
            array.push(Node {
                value: -(i - 1),
                check: -(i + 1),
            });
        }
        // close the free ring over slots 1..=255; slot 0 is the root
        array[1].value = -255;
        array[255].check = -1;

        let mut blocks = vec![Block::default()];
        blocks[0].reset();
        blocks[0].ehead = 1;

        let mut vals = Vec::with_capacity(256);
        vals.resize_with(256, || None);

        Trie {
            array,
            infos: vec![NodeInfo::default(); 256],
            blocks,
            vals,
            vkey: 1,
            reject: (0..=256).map(|i| i + 1).collect(),
            bhead_f: 0,
            bhead_c: 0,
            bhead_o: 0,
            capacity: 256,
            size: 256,
            ordered: true,
            max_trial: 1,
        }
    }

    /// Number of array slots currently formatted (multiple of 256).
    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// Allocated capacity of the node array (multiple of 256).
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Inserts `key` with `value`, replacing the payload if the key is
    /// already present. A key that is a prefix of an existing key (or
    /// the other way round) keeps both: the shared node grows a marker
    /// child at label 0 carrying the older value.
    pub fn insert(&mut self, key: &[u8], value: V) -> Result<()> {
        if key.is_empty() {
            return Err(TrieError::InvalidKey);
        }
        let k = self.next_vkey();
        let p = self.reserve(key);
        let old = self.array[p as usize].value;
        if old >= 0 && old != VALUE_LIMIT {
            // overwriting an existing key releases its old payload
            self.vals[old as usize] = None;
        }
        self.array[p as usize].value = k;
        self.infos[p as usize].end = true;
        self.vals[k as usize] = Some(ValueEntry {
            len: key.len(),
            value,
        });
        Ok(())
    }

    /// Picks the next free value handle by probing forward from the
    /// previous one, modulo the current capacity.
    fn next_vkey(&mut self) -> i32 {
        let mut k = self.vkey;
        loop {
            k = (k + 1) % self.capacity;
            if self.vals[k as usize].is_none() {
                break;
            }
        }
        self.vkey = k;
        k
    }

    /// Walks (and creates) the path for `key` and returns the slot that
    /// holds its value: the terminal node itself, or its label-0 marker
    /// child when the terminal also branches.
    fn reserve(&mut self, key: &[u8]) -> i32 {
        let mut from = ROOT;
        for &b in key {
            let value = self.array[from as usize].value;
            if value >= 0 && value != VALUE_LIMIT {
                // a leaf terminal is about to branch; its value moves to
                // the label-0 marker child before the base is assigned
                let to = self.follow(from, 0);
                self.array[to as usize].value = value;
            }
            from = self.follow(from, b);
        }
        if self.array[from as usize].value < 0 {
            self.follow(from, 0)
        } else {
            from
        }
    }

    /// Follows the edge `(from, label)`, creating the child slot if it
    /// does not exist and relocating a sibling set on slot conflict.
    pub(crate) fn follow(&mut self, from: i32, label: u8) -> i32 {
        let base = self.array[from as usize].base();
        let mut to = base ^ label as i32;
        if base < 0 || self.array[to as usize].check < 0 {
            let mut has_child = false;
            if base >= 0 {
                let first = base ^ self.infos[from as usize].child as i32;
                has_child = self.array[first as usize].check == from;
            }
            to = self.pop_enode(base, label, from);
            let branch = to ^ label as i32;
            self.push_sibling(from, branch, label, has_child);
        } else if self.array[to as usize].check != from {
            to = self.resolve(from, base, label);
        }
        to
    }

    /// Resolves a slot conflict on edge `(from_n, label_n)`: the target
    /// slot belongs to another parent. Whichever parent has the smaller
    /// sibling set is relocated to a freshly found base.
    fn resolve(&mut self, mut from_n: i32, base_n: i32, label_n: u8) -> i32 {
        let to_pn = base_n ^ label_n as i32;
        let from_p = self.array[to_pn as usize].check;
        let base_p = self.array[from_p as usize].base();

        // true: relocate the new parent's set; false: the existing one's
        let flag = self.consult(
            base_n,
            base_p,
            self.infos[from_n as usize].child,
            self.infos[from_p as usize].child,
        );
        let children = if flag {
            self.collect_children(base_n, self.infos[from_n as usize].child, label_n, true)
        } else {
            self.collect_children(base_p, self.infos[from_p as usize].child, 255, false)
        };

        let mut base = if children.len() == 1 {
            self.find_place()
        } else {
            self.find_places(&children)
        };
        base ^= children[0] as i32;

        let (from, nbase) = if flag { (from_n, base_n) } else { (from_p, base_p) };
        if flag && children[0] == label_n {
            self.infos[from as usize].child = label_n;
        }
        self.array[from as usize].value = -base - 1;

        for i in 0..children.len() {
            let to = self.pop_enode(base, children[i], from);
            let newto = nbase ^ children[i] as i32;
            if i == children.len() - 1 {
                self.infos[to as usize].sibling = 0;
            } else {
                self.infos[to as usize].sibling = children[i + 1];
            }
            if flag && newto == to_pn {
                // the slot being fought over: a fresh edge, nothing to move
                continue;
            }
            self.array[to as usize].value = self.array[newto as usize].value;
            if self.array[to as usize].value < 0 && children[i] != 0 {
                // the moved node keeps its base; repoint its children
                let tb = self.array[to as usize].base();
                let mut c = self.infos[newto as usize].child;
                self.infos[to as usize].child = c;
                loop {
                    let gc = tb ^ c as i32;
                    self.array[gc as usize].check = to;
                    c = self.infos[gc as usize].sibling;
                    if c == 0 {
                        break;
                    }
                }
            }
            if !flag && newto == from_n {
                // the triggering parent itself moved; rebind it
                from_n = to;
            }
            if !flag && newto == to_pn {
                // the contested slot becomes the new child of from_n
                self.push_sibling(from_n, to_pn ^ label_n as i32, label_n, true);
                self.infos[newto as usize].child = 0;
                self.array[newto as usize].value = VALUE_LIMIT;
                self.array[newto as usize].check = from_n;
            } else {
                self.push_enode(newto);
            }
        }

        if flag {
            base ^ label_n as i32
        } else {
            to_pn
        }
    }

    /// Compares the sibling-set sizes of two parents by advancing both
    /// rings in lockstep; returns true when the first runs out first.
    fn consult(&self, base_n: i32, base_p: i32, mut c_n: u8, mut c_p: u8) -> bool {
        c_n = self.infos[(base_n ^ c_n as i32) as usize].sibling;
        c_p = self.infos[(base_p ^ c_p as i32) as usize].sibling;
        while c_n != 0 && c_p != 0 {
            c_n = self.infos[(base_n ^ c_n as i32) as usize].sibling;
            c_p = self.infos[(base_p ^ c_p as i32) as usize].sibling;
        }
        c_p != 0
    }

    /// Collects a parent's child labels in order, optionally merging in
    /// `label` at its sorted position (`append_label`).
    fn collect_children(&self, base: i32, mut c: u8, label: u8, append_label: bool) -> Vec<u8> {
        let mut children = Vec::with_capacity(257);
        if c == 0 {
            children.push(c);
            c = self.infos[(base ^ c as i32) as usize].sibling;
        }
        if self.ordered {
            while c != 0 && c <= label {
                children.push(c);
                c = self.infos[(base ^ c as i32) as usize].sibling;
            }
        }
        if append_label {
            children.push(label);
        }
        while c != 0 {
            children.push(c);
            c = self.infos[(base ^ c as i32) as usize].sibling;
        }
        children
    }

    /// Links `label` into the sibling ring under `from`, keeping the
    /// ring sorted. `has_child` tells whether `from` already had any
    /// children before this edge was carved.
    pub(crate) fn push_sibling(&mut self, from: i32, base: i32, label: u8, has_child: bool) {
        let first = self.infos[from as usize].child;
        let keep_order = if self.ordered { label > first } else { first == 0 };

        let mut at_child = true;
        let mut sib_at = ROOT;
        let mut c = first;
        if has_child && keep_order {
            at_child = false;
            sib_at = base ^ c as i32;
            c = self.infos[sib_at as usize].sibling;
            while self.ordered && c != 0 && c < label {
                sib_at = base ^ c as i32;
                c = self.infos[sib_at as usize].sibling;
            }
        }
        self.infos[(base ^ label as i32) as usize].sibling = c;
        if at_child {
            self.infos[from as usize].child = label;
        } else {
            self.infos[sib_at as usize].sibling = label;
        }
    }

    /// Unlinks `label` from the sibling ring under `from`.
    pub(crate) fn pop_sibling(&mut self, from: i32, base: i32, label: u8) {
        let c = self.infos[from as usize].child;
        if c == label {
            self.infos[from as usize].child = self.infos[(base ^ c as i32) as usize].sibling;
            return;
        }
        let mut sib_at = base ^ c as i32;
        loop {
            let next = self.infos[sib_at as usize].sibling;
            if next == label {
                self.infos[sib_at as usize].sibling =
                    self.infos[(base ^ next as i32) as usize].sibling;
                return;
            }
            sib_at = base ^ next as i32;
        }
    }
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self::new()
    }
}
