//! Saving and loading tries.
//!
//! Two formats are supported:
//!
//! - [`TrieFormat::Json`] — the whole structure as JSON, convenient for
//!   debugging and tooling,
//! - [`TrieFormat::Binary`] — a compact little-endian image: a versioned
//!   header with section sizes, the raw node/info/block arrays, and the
//!   value table embedded as an encoded data section.
//!
//! A round-trip preserves [`Trie::status`] exactly, and a matcher built
//! over a reloaded trie produces identical matches.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{Result, TrieError};
use crate::node::{Block, Node, NodeInfo};
use crate::trie::{Trie, ValueEntry};

/// Magic bytes identifying a binary trie image.
pub const FORMAT_MAGIC: &[u8; 8] = b"CEDRUSDA";

/// Current binary image version.
pub const FORMAT_VERSION: u32 = 1;

/// Serialization format selector for [`Trie::save`] and [`Trie::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrieFormat {
    /// Human-readable JSON of the whole structure.
    Json,
    /// Compact little-endian binary image.
    Binary,
}

/// Image header (64 bytes). All section offsets are implied by the
/// counts: nodes, infos, blocks, and the reject table follow the header
/// in that order, then `values_size` bytes of encoded value rows.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct ImageHeader {
    /// Magic bytes: "CEDRUSDA".
    magic: [u8; 8],
    /// Format version (currently 1).
    version: u32,
    /// Formatted slot count.
    size: u32,
    /// Allocated slot capacity; nodes/infos sections have this many rows.
    capacity: u32,
    /// Full-ring head block.
    bhead_f: i32,
    /// Closed-ring head block.
    bhead_c: i32,
    /// Open-ring head block.
    bhead_o: i32,
    /// Value-handle probe cursor.
    vkey: i32,
    /// Placement retry bound.
    max_trial: i32,
    /// Bit 0: ordered sibling rings.
    flags: u32,
    /// Number of encoded value rows.
    value_count: u32,
    /// Byte length of the encoded value section.
    values_size: u32,
    /// 0x01 = little-endian writer.
    endianness: u8,
    reserved: [u8; 11],
}

const FLAG_ORDERED: u32 = 1;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct NodeRecord {
    value: i32,
    check: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct InfoRecord {
    sibling: u8,
    child: u8,
    end: u8,
    reserved: u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct BlockRecord {
    prev: i32,
    next: i32,
    num: i32,
    reject: i32,
    trial: i32,
    ehead: i32,
}

/// One occupied value-table row as stored in the image's data section.
#[derive(Serialize, Deserialize)]
struct ValueRow<V> {
    vkey: i32,
    len: usize,
    value: V,
}

fn format_err(what: &str) -> TrieError {
    TrieError::Format(what.to_string())
}

impl<V: Serialize> Trie<V> {
    /// Writes the trie to `w` in the given format.
    pub fn save<W: Write>(&self, w: W, format: TrieFormat) -> Result<()> {
        match format {
            TrieFormat::Json => {
                serde_json::to_writer(w, self).map_err(|e| TrieError::Format(e.to_string()))
            }
            TrieFormat::Binary => self.save_binary(w),
        }
    }

    /// Writes the trie to the file at `path` in the given format.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, format: TrieFormat) -> Result<()> {
        let f = File::create(path)?;
        self.save(BufWriter::new(f), format)
    }

    fn save_binary<W: Write>(&self, mut w: W) -> Result<()> {
        let rows: Vec<ValueRow<&V>> = self
            .vals
            .iter()
            .enumerate()
            .filter_map(|(k, slot)| {
                slot.as_ref().map(|entry| ValueRow {
                    vkey: k as i32,
                    len: entry.len,
                    value: &entry.value,
                })
            })
            .collect();
        let values_blob =
            serde_json::to_vec(&rows).map_err(|e| TrieError::Format(e.to_string()))?;

        let header = ImageHeader {
            magic: *FORMAT_MAGIC,
            version: FORMAT_VERSION,
            size: self.size as u32,
            capacity: self.capacity as u32,
            bhead_f: self.bhead_f,
            bhead_c: self.bhead_c,
            bhead_o: self.bhead_o,
            vkey: self.vkey,
            max_trial: self.max_trial,
            flags: if self.ordered { FLAG_ORDERED } else { 0 },
            value_count: rows.len() as u32,
            values_size: values_blob.len() as u32,
            endianness: 0x01,
            reserved: [0; 11],
        };
        w.write_all(header.as_bytes())?;

        let nodes: Vec<NodeRecord> = self
            .array
            .iter()
            .map(|n| NodeRecord {
                value: n.value,
                check: n.check,
            })
            .collect();
        w.write_all(nodes.as_bytes())?;

        let infos: Vec<InfoRecord> = self
            .infos
            .iter()
            .map(|i| InfoRecord {
                sibling: i.sibling,
                child: i.child,
                end: i.end as u8,
                reserved: 0,
            })
            .collect();
        w.write_all(infos.as_bytes())?;

        let blocks: Vec<BlockRecord> = self
            .blocks
            .iter()
            .map(|b| BlockRecord {
                prev: b.prev,
                next: b.next,
                num: b.num,
                reject: b.reject,
                trial: b.trial,
                ehead: b.ehead,
            })
            .collect();
        w.write_all(blocks.as_bytes())?;

        w.write_all(self.reject.as_slice().as_bytes())?;
        w.write_all(&values_blob)?;
        tracing::debug!(
            capacity = self.capacity,
            values = rows.len(),
            blob = values_blob.len(),
            "saved binary trie image"
        );
        Ok(())
    }
}

impl<V: DeserializeOwned> Trie<V> {
    /// Reads a trie from `r` in the given format.
    pub fn load<R: Read>(r: R, format: TrieFormat) -> Result<Self> {
        match format {
            TrieFormat::Json => {
                serde_json::from_reader(r).map_err(|e| TrieError::Format(e.to_string()))
            }
            TrieFormat::Binary => Self::load_binary(r),
        }
    }

    /// Reads a trie from the file at `path` in the given format.
    pub fn load_from_file<P: AsRef<Path>>(path: P, format: TrieFormat) -> Result<Self> {
        let f = File::open(path)?;
        Self::load(BufReader::new(f), format)
    }

    fn load_binary<R: Read>(mut r: R) -> Result<Self> {
        let mut buf = Vec::new();
        r.read_to_end(&mut buf)?;

        let (header, mut rest) =
            ImageHeader::read_from_prefix(&buf).map_err(|_| format_err("truncated header"))?;
        if &header.magic != FORMAT_MAGIC {
            return Err(format_err("bad magic"));
        }
        if header.version != FORMAT_VERSION {
            return Err(TrieError::Format(format!(
                "unsupported image version {}",
                header.version
            )));
        }
        let capacity = header.capacity as usize;
        let size = header.size as usize;
        if capacity == 0 || capacity % 256 != 0 || size > capacity || size % 256 != 0 {
            return Err(format_err("inconsistent size/capacity"));
        }

        let nodes = read_section::<NodeRecord>(&mut rest, capacity)?;
        let infos = read_section::<InfoRecord>(&mut rest, capacity)?;
        let blocks = read_section::<BlockRecord>(&mut rest, capacity >> 8)?;
        let reject = read_section::<i32>(&mut rest, 257)?;
        if rest.len() != header.values_size as usize {
            return Err(format_err("value section size mismatch"));
        }

        let rows: Vec<ValueRow<V>> =
            serde_json::from_slice(rest).map_err(|e| TrieError::Format(e.to_string()))?;
        if rows.len() != header.value_count as usize {
            return Err(format_err("value row count mismatch"));
        }
        let mut vals: Vec<Option<ValueEntry<V>>> = Vec::with_capacity(capacity);
        vals.resize_with(capacity, || None);
        for row in rows {
            let slot = vals
                .get_mut(row.vkey as usize)
                .ok_or_else(|| format_err("value handle out of range"))?;
            *slot = Some(ValueEntry {
                len: row.len,
                value: row.value,
            });
        }

        tracing::debug!(capacity, size, "loaded binary trie image");
        Ok(Trie {
            array: nodes
                .into_iter()
                .map(|n| Node {
                    value: n.value,
                    check: n.check,
                })
                .collect(),
            infos: infos
                .into_iter()
                .map(|i| NodeInfo {
                    sibling: i.sibling,
                    child: i.child,
                    end: i.end != 0,
                })
                .collect(),
            blocks: blocks
                .into_iter()
                .map(|b| Block {
                    prev: b.prev,
                    next: b.next,
                    num: b.num,
                    reject: b.reject,
                    trial: b.trial,
                    ehead: b.ehead,
                })
                .collect(),
            vals,
            vkey: header.vkey,
            reject,
            bhead_f: header.bhead_f,
            bhead_c: header.bhead_c,
            bhead_o: header.bhead_o,
            capacity: capacity as i32,
            size: size as i32,
            ordered: header.flags & FLAG_ORDERED != 0,
            max_trial: header.max_trial,
        })
    }
}

/// Copies `count` records out of the front of `rest`. Plain copies, so
/// the source needs no particular alignment.
fn read_section<T: FromBytes + Copy>(rest: &mut &[u8], count: usize) -> Result<Vec<T>> {
    let bytes = count
        .checked_mul(std::mem::size_of::<T>())
        .ok_or_else(|| format_err("section size overflow"))?;
    if rest.len() < bytes {
        return Err(format_err("truncated section"));
    }
    let (section, tail) = rest.split_at(bytes);
    *rest = tail;
    let mut out = Vec::with_capacity(count);
    for chunk in section.chunks_exact(std::mem::size_of::<T>()) {
        let rec = T::read_from_bytes(chunk).map_err(|_| format_err("malformed record"))?;
        out.push(rec);
    }
    Ok(out)
}
