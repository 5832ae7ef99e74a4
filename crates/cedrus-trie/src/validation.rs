//! Structure validation for tries.
//!
//! Walks the node array and the block rings and cross-checks every
//! embedded invariant: parent/child linkage, sibling-ring ordering,
//! free-ring population, and value-table consistency. Used by the test
//! suites; cheap enough to run after every mutation in a property test.

use crate::node::VALUE_LIMIT;
use crate::trie::{Trie, ROOT};

/// Validation outcome: accumulated errors, warnings, and counts.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Invariant violations; a non-empty list means the trie is corrupt.
    pub errors: Vec<String>,
    /// Suspicious but non-fatal observations.
    pub warnings: Vec<String>,
    /// Statistics gathered during the walk.
    pub stats: TrieStats,
}

/// Counts gathered while validating.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrieStats {
    /// Occupied slots.
    pub node_count: usize,
    /// Slots carrying a value handle.
    pub key_count: usize,
    /// Free slots.
    pub free_count: usize,
    /// Formatted blocks.
    pub block_count: usize,
}

impl ValidationResult {
    /// True when no invariant violations were found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates the full trie structure.
pub fn validate_structure<V>(trie: &Trie<V>) -> ValidationResult {
    let mut result = ValidationResult::default();
    let size = trie.size() as i32;
    result.stats.block_count = (size >> 8) as usize;

    check_slots(trie, size, &mut result);
    check_sibling_rings(trie, size, &mut result);
    check_free_rings(trie, size, &mut result);
    check_value_table(trie, size, &mut result);

    result
}

/// Per-slot linkage: every occupied non-root slot must be reachable from
/// its recorded parent over the label implied by the parent's base.
fn check_slots<V>(trie: &Trie<V>, size: i32, result: &mut ValidationResult) {
    for id in 0..size {
        let n = trie.array[id as usize];
        if n.check < 0 {
            result.stats.free_count += 1;
            continue;
        }
        result.stats.node_count += 1;
        if n.value >= 0 {
            result.stats.key_count += 1;
            if n.value == VALUE_LIMIT {
                result
                    .errors
                    .push(format!("slot {} still carries the fresh-slot sentinel", id));
            }
        }
        if id == ROOT {
            continue;
        }
        let parent = n.check;
        if parent >= size {
            result
                .errors
                .push(format!("slot {} has out-of-range parent {}", id, parent));
            continue;
        }
        let pn = trie.array[parent as usize];
        if pn.check < 0 {
            result
                .errors
                .push(format!("slot {} has a freed parent {}", id, parent));
            continue;
        }
        let base = pn.base();
        let label = base ^ id;
        if !(0..=255).contains(&label) {
            result.errors.push(format!(
                "slot {} is not addressable from parent {} (base {})",
                id, parent, base
            ));
        }
    }
}

/// Sibling rings: each parent's ring must list exactly its children, in
/// strictly ascending label order, each child slot checking back.
fn check_sibling_rings<V>(trie: &Trie<V>, size: i32, result: &mut ValidationResult) {
    for id in 0..size {
        let n = trie.array[id as usize];
        if n.check < 0 || n.value >= 0 {
            continue;
        }
        let base = n.base();
        let mut expected = 0usize;
        for probe in 0..=255u8 {
            let slot = base ^ probe as i32;
            // the root checks to itself; a slot is never its own child
            if slot >= 0 && slot < size && slot != id && trie.array[slot as usize].check == id {
                expected += 1;
            }
        }

        // walk the ring, marker child included
        let mut c = trie.infos[id as usize].child;
        if c == 0 && !(base >= 0 && base < size && trie.array[base as usize].check == id) {
            // child == 0 without a marker slot means "no children"
            if expected != 0 {
                result
                    .errors
                    .push(format!("branch {} has children but an empty ring", id));
            } else {
                result.warnings.push(format!("branch {} is childless", id));
            }
            continue;
        }
        let mut seen = 0usize;
        let mut last: i32 = -1;
        let mut broke = false;
        loop {
            if seen > 0 && last >= c as i32 {
                result
                    .errors
                    .push(format!("sibling ring of {} is not sorted", id));
                broke = true;
                break;
            }
            last = c as i32;
            let slot = base ^ c as i32;
            if slot < 0 || slot >= size || trie.array[slot as usize].check != id {
                result.errors.push(format!(
                    "sibling ring of {} lists label {} with no matching slot",
                    id, c
                ));
                broke = true;
                break;
            }
            seen += 1;
            c = trie.infos[slot as usize].sibling;
            if c == 0 {
                break;
            }
        }
        if !broke && seen != expected {
            result.errors.push(format!(
                "branch {} ring lists {} children, array has {}",
                id, seen, expected
            ));
        }
    }
}

/// Free rings: per block, the population of `check < 0` slots must match
/// `num` (block 0 runs one below, it carries the root), and the ring
/// must be circular within the block.
fn check_free_rings<V>(trie: &Trie<V>, size: i32, result: &mut ValidationResult) {
    for bi in 0..(size >> 8) {
        let block = &trie.blocks[bi as usize];
        let lo = bi << 8;
        let hi = lo + 256;
        let free = (lo..hi)
            .filter(|&i| trie.array[i as usize].check < 0)
            .count() as i32;
        let expected = if bi == 0 { block.num - 1 } else { block.num };
        if free != expected {
            result.errors.push(format!(
                "block {}: num {} disagrees with {} free slots",
                bi, block.num, free
            ));
            continue;
        }
        if free == 0 {
            continue;
        }
        let mut e = block.ehead;
        let mut walked = 0;
        let mut broke = false;
        loop {
            if e < lo || e >= hi {
                result
                    .errors
                    .push(format!("block {}: free ring escapes the block at {}", bi, e));
                broke = true;
                break;
            }
            if trie.array[e as usize].check >= 0 {
                result
                    .errors
                    .push(format!("block {}: free ring visits occupied slot {}", bi, e));
                broke = true;
                break;
            }
            walked += 1;
            if walked > free {
                result
                    .errors
                    .push(format!("block {}: free ring longer than {}", bi, free));
                broke = true;
                break;
            }
            e = -trie.array[e as usize].check;
            if e == block.ehead {
                break;
            }
        }
        if !broke && walked != free {
            result.errors.push(format!(
                "block {}: free ring covers {} of {} slots",
                bi, walked, free
            ));
        }
    }
}

/// Value table: every terminal slot must resolve to a live entry, and
/// every live entry must be owned by exactly one terminal slot.
fn check_value_table<V>(trie: &Trie<V>, size: i32, result: &mut ValidationResult) {
    let mut referenced = vec![0usize; trie.capacity()];
    for id in 0..size {
        let n = trie.array[id as usize];
        if n.check < 0 || n.value < 0 || n.value == VALUE_LIMIT {
            continue;
        }
        let vk = n.value as usize;
        if vk >= referenced.len() {
            result
                .errors
                .push(format!("slot {} holds out-of-range value handle {}", id, vk));
            continue;
        }
        referenced[vk] += 1;
        if trie.vals[vk].is_none() {
            result
                .errors
                .push(format!("slot {} points at an empty value entry {}", id, vk));
        }
    }
    for (vk, count) in referenced.iter().enumerate() {
        match (trie.vals[vk].is_some(), *count) {
            (true, 1) | (false, 0) => {}
            (true, 0) => result
                .errors
                .push(format!("value entry {} is owned by no slot", vk)),
            (_, n) => result
                .errors
                .push(format!("value entry {} is owned by {} slots", vk, n)),
        }
    }
}
