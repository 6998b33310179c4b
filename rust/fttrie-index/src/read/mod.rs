//! Trie traversal and lookup.
//!
//! This module implements the read side of the full-text trie:
//! - **Node codec**: [`node::TrieDecoder`] turns a node id into a [`node::TrieNode`]
//! - **Cursor**: a byte-granular position in the trie, used by every search to step
//!   across label and node boundaries
//! - **Exact lookup**: literal descent from the root
//! - **Wildcard search**: the `.`, `.*`, `.+` and `.?` operators
//! - **Fuzzy search**: bounded edit-distance enumeration with branch-and-bound pruning
//! - **Token walk** and **integrity scan**: full traversals for diagnostics
//!
//! All searches resolve to a [`MatchSet`] of terminal nodes; turning those into postings
//! is left to the caller.

use std::collections::BTreeMap;

pub(crate) mod cursor;
pub mod exact;
pub mod fuzzy;
pub mod integrity;
pub mod node;
pub mod tokens;
pub mod wildcard;

/// A token that ends at a trie node, with the location of its postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TermEntry {
    /// Id of the node the token ends at.
    pub node: u32,
    pub posting_size: u32,
    pub posting_pointer: u64,
}

/// Set of matched tokens, keyed and ordered by node id.
///
/// A node enters the set once no matter how many search paths reach it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    entries: BTreeMap<u32, TermEntry>,
}

impl MatchSet {
    pub fn new() -> MatchSet {
        Default::default()
    }

    pub fn insert(&mut self, entry: TermEntry) {
        self.entries.insert(entry.node, entry);
    }

    pub fn extend(&mut self, other: MatchSet) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, node: u32) -> bool {
        self.entries.contains_key(&node)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TermEntry> {
        self.entries.values()
    }

    pub fn into_entries(self) -> Vec<TermEntry> {
        self.entries.into_values().collect()
    }
}
