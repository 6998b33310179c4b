//! Trie node codec.
//!
//! Every node occupies the byte range `[offsets[id], offsets[id + 1])` of the node stream:
//!
//! ```text
//! [label len: u8][label: u8 x len][child id: u32, first byte: u8]*[posting size: u32][posting pointer: u40]
//! ```
//!
//! Child descriptors are present while more than [`FOOTER_SIZE`] bytes remain in the range.

use byteorder::{BigEndian, ByteOrder};
use fttrie_common::{Result, error::Error, verify_data};
use fttrie_io::Segment;

use crate::read::TermEntry;

/// Id of the root node. The root has an empty label.
pub const ROOT: u32 = 0;

/// Size of the posting footer closing every node entry: 4-byte size + 5-byte pointer.
pub const FOOTER_SIZE: usize = 9;

/// Size of one child descriptor: 4-byte child id + first label byte of the child.
pub const CHILD_SIZE: usize = 5;

/// A reference from a node to one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRef {
    pub id: u32,
    /// First byte of the child's label.
    pub first_byte: u8,
}

/// In-memory form of a decoded trie node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrieNode {
    pub id: u32,
    /// Edge label from the parent; empty only at the root.
    pub label: Vec<u8>,
    /// Children, strictly ascending by `first_byte`.
    pub children: Vec<ChildRef>,
    /// Number of postings of the token ending at this node, 0 for pure branching nodes.
    pub posting_size: u32,
    /// Offset of the postings within the posting stream; meaningful only when
    /// `posting_size > 0`.
    pub posting_pointer: u64,
}

impl TrieNode {
    pub fn is_root(&self) -> bool {
        self.id == ROOT
    }

    pub fn has_postings(&self) -> bool {
        self.posting_size > 0
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Finds the child whose label starts with `byte`.
    pub fn find_child(&self, byte: u8) -> Option<ChildRef> {
        self.children
            .binary_search_by_key(&byte, |c| c.first_byte)
            .ok()
            .map(|idx| self.children[idx])
    }

    /// The token ending at this node, if any.
    pub fn term(&self) -> Option<TermEntry> {
        self.has_postings().then_some(TermEntry {
            node: self.id,
            posting_size: self.posting_size,
            posting_pointer: self.posting_pointer,
        })
    }
}

/// Decodes trie nodes from the offsets and node streams.
///
/// The decoder holds no per-query state: every call is a pair of positioned reads, so one
/// decoder can be shared by concurrent queries.
#[derive(Debug, Clone)]
pub struct TrieDecoder {
    offsets: Segment,
    nodes: Segment,
    node_count: u32,
}

impl TrieDecoder {
    /// Creates a decoder over the given offsets and node stream segments.
    ///
    /// # Errors
    ///
    /// Returns a format error if the offsets segment is not a whole number of 4-byte
    /// entries or does not describe at least the root node.
    pub fn new(offsets: Segment, nodes: Segment) -> Result<TrieDecoder> {
        verify_data!(offsets, offsets.len() % 4 == 0);
        verify_data!(offsets, offsets.len() >= 8);
        let node_count = u32::try_from(offsets.len() / 4 - 1)
            .map_err(|_| Error::corrupted(offsets.name(), "too many node offsets"))?;
        Ok(TrieDecoder {
            offsets,
            nodes,
            node_count,
        })
    }

    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Combined size of the offsets and node streams in bytes.
    pub fn size_on_disk(&self) -> u64 {
        self.offsets.len() + self.nodes.len()
    }

    pub fn root(&self) -> Result<TrieNode> {
        self.decode_node(ROOT)
    }

    /// Reads and parses node `id`.
    ///
    /// # Errors
    ///
    /// Fails with a format error when `id` is out of range or the node entry is malformed,
    /// and with an I/O error when the underlying read fails.
    pub fn decode_node(&self, id: u32) -> Result<TrieNode> {
        if id >= self.node_count {
            return Err(Error::corrupted(
                self.offsets.name(),
                format!("node id {id} out of range (node count {})", self.node_count),
            ));
        }
        let bounds = self.offsets.read_u32_vec(id as u64 * 4, 2)?;
        let (start, end) = (bounds[0] as u64, bounds[1] as u64);
        if start >= end || end > self.nodes.len() {
            return Err(Error::corrupted(
                self.nodes.name(),
                format!("node {id} has invalid byte range {start}..{end}"),
            ));
        }
        let buf = self.nodes.read_bytes(start..end)?;
        parse_node(id, &buf).map_err(|message| Error::corrupted(self.nodes.name(), message))
    }

    /// Starts tracking the nodes entered by a walk over the trie.
    pub(crate) fn visited_nodes(&self) -> VisitedNodes {
        VisitedNodes {
            segment: self.nodes.name().to_string(),
            seen: vec![false; self.node_count as usize],
        }
    }

    /// Decodes the node referenced by `child`, checking that its label starts with the
    /// byte the parent advertises.
    pub fn decode_child(&self, child: ChildRef) -> Result<TrieNode> {
        let node = self.decode_node(child.id)?;
        if node.label.first() != Some(&child.first_byte) {
            return Err(Error::corrupted(
                self.nodes.name(),
                format!(
                    "child {} label does not start with byte {:#04x}",
                    child.id, child.first_byte
                ),
            ));
        }
        Ok(node)
    }
}

/// Nodes already entered by a walk.
///
/// A well-formed trie is a tree, so a walk from any node enters every node below it once.
/// Entering a node again means a child reference loops back or is shared.
pub(crate) struct VisitedNodes {
    segment: String,
    seen: Vec<bool>,
}

impl VisitedNodes {
    /// Marks `id` as entered, failing with a format error if it already was.
    ///
    /// Out-of-range ids are left to [`TrieDecoder::decode_node`] to report.
    pub fn enter(&mut self, id: u32) -> Result<()> {
        match self.seen.get_mut(id as usize) {
            Some(seen) if *seen => Err(Error::corrupted(
                self.segment.as_str(),
                format!("node {id} reached twice; child references form a cycle or are shared"),
            )),
            Some(seen) => {
                *seen = true;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn parse_node(id: u32, buf: &[u8]) -> std::result::Result<TrieNode, String> {
    let label_len = buf[0] as usize;
    let children_start = 1 + label_len;
    if buf.len() < children_start + FOOTER_SIZE {
        return Err(format!(
            "node {id} entry of {} bytes cannot hold a label of {label_len} bytes",
            buf.len()
        ));
    }
    let footer_start = buf.len() - FOOTER_SIZE;
    let child_bytes = &buf[children_start..footer_start];
    if child_bytes.len() % CHILD_SIZE != 0 {
        return Err(format!(
            "node {id} child area of {} bytes is not a multiple of {CHILD_SIZE}",
            child_bytes.len()
        ));
    }

    let children = child_bytes
        .chunks_exact(CHILD_SIZE)
        .map(|c| ChildRef {
            id: BigEndian::read_u32(&c[..4]),
            first_byte: c[4],
        })
        .collect();
    let footer = &buf[footer_start..];
    Ok(TrieNode {
        id,
        label: buf[1..children_start].to_vec(),
        children,
        posting_size: BigEndian::read_u32(&footer[..4]),
        posting_pointer: BigEndian::read_uint(&footer[4..], 5),
    })
}
