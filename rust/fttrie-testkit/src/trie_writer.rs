//! Writes a token vocabulary in the on-disk trie layout.
//!
//! Node stream entry, for every node id in preorder (root = 0):
//!
//! ```text
//! [label len: u8][label bytes][child id: u32, child first byte: u8]*[posting size: u32][posting pointer: u40]
//! ```
//!
//! Posting stream entry at `posting pointer`:
//!
//! ```text
//! [pre: u32] x size, then for each posting: [count: u32][position: u32] x count
//! ```
//!
//! The offsets stream holds the start of every node entry plus the end of the last one.
//! All integers are big-endian.

use std::{
    collections::{BTreeMap, BTreeSet},
    ops::Range,
    path::Path,
};

use anyhow::{Context, bail};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use fttrie_io::MemorySegmentStore;

/// Default segment name prefix, matching the index reader default.
pub const DEFAULT_PREFIX: &str = "ftx";

/// Collects tokens with their postings and lays them out as trie index segments.
#[derive(Debug, Clone)]
pub struct TrieIndexWriter {
    prefix: String,
    tokens: BTreeMap<Vec<u8>, BTreeMap<u32, BTreeSet<u32>>>,
}

impl Default for TrieIndexWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TrieIndexWriter {
    pub fn new() -> TrieIndexWriter {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> TrieIndexWriter {
        TrieIndexWriter {
            prefix: prefix.into(),
            tokens: BTreeMap::new(),
        }
    }

    /// Records occurrences of `token` at `positions` within node `pre`.
    ///
    /// Repeated calls for the same token and pre-value merge their positions.
    pub fn add(&mut self, token: impl AsRef<[u8]>, pre: u32, positions: &[u32]) -> &mut Self {
        self.tokens
            .entry(token.as_ref().to_vec())
            .or_default()
            .entry(pre)
            .or_default()
            .extend(positions.iter().copied());
        self
    }

    /// Number of distinct tokens added so far.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Number of postings recorded for `token`.
    pub fn posting_count(&self, token: impl AsRef<[u8]>) -> usize {
        self.tokens.get(token.as_ref()).map_or(0, |p| p.len())
    }

    /// Lays out the collected vocabulary.
    pub fn finish(&self) -> anyhow::Result<TrieSegments> {
        let mut trie = RadixTrie::new();
        for (token, postings) in &self.tokens {
            if token.is_empty() {
                bail!("empty token cannot be indexed");
            }
            if postings.values().any(|positions| positions.is_empty()) {
                bail!(
                    "token {:?} has a posting without positions",
                    String::from_utf8_lossy(token)
                );
            }
            trie.insert(token, postings);
        }
        trie.write(&self.prefix)
    }

    /// Lays out the vocabulary and returns it as an in-memory segment store.
    pub fn build_memory(&self) -> anyhow::Result<MemorySegmentStore> {
        Ok(self.finish()?.into_store())
    }

    /// Lays out the vocabulary and writes the three segment files into `dir`.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> anyhow::Result<()> {
        self.finish()?.write_to_dir(dir)
    }
}

/// Raw bytes of the three trie index segments.
#[derive(Debug, Clone)]
pub struct TrieSegments {
    pub prefix: String,
    pub nodes: Vec<u8>,
    pub postings: Vec<u8>,
    pub offsets: Vec<u8>,
    pub node_count: u32,
}

impl TrieSegments {
    pub fn nodes_name(&self) -> String {
        format!("{}a", self.prefix)
    }

    pub fn postings_name(&self) -> String {
        format!("{}b", self.prefix)
    }

    pub fn offsets_name(&self) -> String {
        format!("{}c", self.prefix)
    }

    pub fn into_store(self) -> MemorySegmentStore {
        let names = [self.nodes_name(), self.postings_name(), self.offsets_name()];
        let TrieSegments {
            nodes,
            postings,
            offsets,
            ..
        } = self;
        let mut store = MemorySegmentStore::new();
        for (name, bytes) in names.into_iter().zip([nodes, postings, offsets]) {
            store.insert(name, bytes);
        }
        store
    }

    /// Byte range of node `id` within the node stream.
    pub fn node_range(&self, id: u32) -> Range<usize> {
        let at = |i: usize| BigEndian::read_u32(&self.offsets[i * 4..i * 4 + 4]) as usize;
        at(id as usize)..at(id as usize + 1)
    }

    /// Overwrites child descriptor `slot` of node `id`, e.g. to lay out a damaged trie.
    pub fn set_child(&mut self, id: u32, slot: usize, child: u32, first_byte: u8) {
        let range = self.node_range(id);
        let at = range.start + 1 + self.nodes[range.start] as usize + slot * 5;
        assert!(at + 5 <= range.end - 9, "node {id} has no child slot {slot}");
        BigEndian::write_u32(&mut self.nodes[at..at + 4], child);
        self.nodes[at + 4] = first_byte;
    }

    /// Sets the posting size of node `id` to 0, detaching its postings.
    pub fn clear_postings(&mut self, id: u32) {
        let footer = self.node_range(id).end - 9;
        BigEndian::write_u32(&mut self.nodes[footer..footer + 4], 0);
    }

    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> anyhow::Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        for (name, bytes) in [
            (self.nodes_name(), &self.nodes),
            (self.postings_name(), &self.postings),
            (self.offsets_name(), &self.offsets),
        ] {
            let path = dir.join(name);
            std::fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
        }
        Ok(())
    }
}

struct BuildNode<'a> {
    label: Vec<u8>,
    children: Vec<usize>,
    postings: Option<&'a BTreeMap<u32, BTreeSet<u32>>>,
}

impl<'a> BuildNode<'a> {
    fn new(label: Vec<u8>, postings: Option<&'a BTreeMap<u32, BTreeSet<u32>>>) -> Self {
        BuildNode {
            label,
            children: Vec::new(),
            postings,
        }
    }
}

/// Arena-backed radix trie; node 0 is the root.
struct RadixTrie<'a> {
    arena: Vec<BuildNode<'a>>,
}

impl<'a> RadixTrie<'a> {
    fn new() -> Self {
        RadixTrie {
            arena: vec![BuildNode::new(Vec::new(), None)],
        }
    }

    fn insert(&mut self, token: &[u8], postings: &'a BTreeMap<u32, BTreeSet<u32>>) {
        let mut node = 0;
        let mut rest = token;
        loop {
            let Some(child) = self.child_by_first_byte(node, rest[0]) else {
                let leaf = self.push(BuildNode::new(rest.to_vec(), Some(postings)));
                self.attach(node, leaf);
                return;
            };

            let common = self.arena[child]
                .label
                .iter()
                .zip(rest)
                .take_while(|(a, b)| a == b)
                .count();
            rest = &rest[common..];

            if common < self.arena[child].label.len() {
                // Split `child` into the common prefix and a new node with the remainder.
                let tail = self.arena[child].label.split_off(common);
                let moved_children = std::mem::take(&mut self.arena[child].children);
                let moved_postings = self.arena[child].postings.take();
                let split = self.push(BuildNode {
                    label: tail,
                    children: moved_children,
                    postings: moved_postings,
                });
                self.arena[child].children.push(split);
                if rest.is_empty() {
                    self.arena[child].postings = Some(postings);
                } else {
                    let leaf = self.push(BuildNode::new(rest.to_vec(), Some(postings)));
                    self.attach(child, leaf);
                }
                return;
            }

            if rest.is_empty() {
                self.arena[child].postings = Some(postings);
                return;
            }
            node = child;
        }
    }

    fn child_by_first_byte(&self, node: usize, byte: u8) -> Option<usize> {
        self.arena[node]
            .children
            .iter()
            .copied()
            .find(|&c| self.arena[c].label[0] == byte)
    }

    fn push(&mut self, node: BuildNode<'a>) -> usize {
        self.arena.push(node);
        self.arena.len() - 1
    }

    fn attach(&mut self, parent: usize, child: usize) {
        let byte = self.arena[child].label[0];
        let pos = self.arena[parent]
            .children
            .partition_point(|&c| self.arena[c].label[0] < byte);
        self.arena[parent].children.insert(pos, child);
    }

    /// Returns arena indices in preorder; the position in the result is the node id.
    fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.arena.len());
        let mut stack = vec![0];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.arena[node].children.iter().rev());
        }
        order
    }

    fn write(&self, prefix: &str) -> anyhow::Result<TrieSegments> {
        let order = self.preorder();
        let mut ids = vec![0u32; self.arena.len()];
        for (id, &node) in order.iter().enumerate() {
            ids[node] = u32::try_from(id).context("too many trie nodes")?;
        }

        let mut nodes = Vec::new();
        let mut postings = Vec::new();
        let mut offsets = Vec::with_capacity(4 * (order.len() + 1));

        for &idx in &order {
            let node = &self.arena[idx];
            offsets.write_u32::<BigEndian>(
                u32::try_from(nodes.len()).context("node stream exceeds 4 GiB")?,
            )?;

            let label_len = u8::try_from(node.label.len()).with_context(|| {
                format!(
                    "label {:?} longer than 255 bytes",
                    String::from_utf8_lossy(&node.label)
                )
            })?;
            nodes.push(label_len);
            nodes.extend_from_slice(&node.label);

            for &child in &node.children {
                nodes.write_u32::<BigEndian>(ids[child])?;
                nodes.push(self.arena[child].label[0]);
            }

            let (size, pointer) = match node.postings {
                Some(entries) => (entries.len() as u32, write_postings(&mut postings, entries)?),
                None => (0, 0),
            };
            nodes.write_u32::<BigEndian>(size)?;
            nodes.write_uint::<BigEndian>(pointer, 5)?;
        }
        offsets.write_u32::<BigEndian>(
            u32::try_from(nodes.len()).context("node stream exceeds 4 GiB")?,
        )?;

        Ok(TrieSegments {
            prefix: prefix.to_string(),
            nodes,
            postings,
            offsets,
            node_count: order.len() as u32,
        })
    }
}

fn write_postings(
    out: &mut Vec<u8>,
    entries: &BTreeMap<u32, BTreeSet<u32>>,
) -> anyhow::Result<u64> {
    let pointer = out.len() as u64;
    for &pre in entries.keys() {
        out.write_u32::<BigEndian>(pre)?;
    }
    for positions in entries.values() {
        out.write_u32::<BigEndian>(positions.len() as u32)?;
        for &pos in positions {
            out.write_u32::<BigEndian>(pos)?;
        }
    }
    Ok(pointer)
}
