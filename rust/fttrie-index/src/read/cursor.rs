//! Byte-granular positions in the trie.

use std::sync::Arc;

use fttrie_common::Result;

use crate::read::{
    TermEntry,
    node::{TrieDecoder, TrieNode},
};

/// A position between two bytes of a root-to-leaf path: `node` plus the number of its
/// label bytes already consumed.
///
/// At `offset == label.len()` the cursor sits on the node boundary, where the token
/// spelled so far is the node's full path and the next byte selects a child.
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    node: Arc<TrieNode>,
    offset: usize,
}

impl Cursor {
    pub fn new(node: TrieNode, offset: usize) -> Cursor {
        debug_assert!(offset <= node.label.len());
        Cursor {
            node: Arc::new(node),
            offset,
        }
    }

    /// A cursor on the boundary of `node`.
    pub fn at_end(node: TrieNode) -> Cursor {
        let offset = node.label.len();
        Cursor::new(node, offset)
    }

    pub fn node(&self) -> &TrieNode {
        &self.node
    }

    pub fn at_boundary(&self) -> bool {
        self.offset == self.node.label.len()
    }

    /// The next label byte, unless the cursor is on the node boundary.
    pub fn pending_byte(&self) -> Option<u8> {
        self.node.label.get(self.offset).copied()
    }

    /// The token ending exactly at this cursor, if any.
    pub fn term(&self) -> Option<TermEntry> {
        if self.at_boundary() {
            self.node.term()
        } else {
            None
        }
    }

    /// The cursor one label byte further. Only valid when [`Cursor::pending_byte`] is some.
    pub fn advanced(&self) -> Cursor {
        Cursor {
            node: Arc::clone(&self.node),
            offset: self.offset + 1,
        }
    }
}

impl TrieDecoder {
    /// Consumes `byte` from `cursor`, returning `None` if no token continues with it.
    pub(crate) fn step(&self, cursor: &Cursor, byte: u8) -> Result<Option<Cursor>> {
        if let Some(pending) = cursor.pending_byte() {
            return Ok((pending == byte).then(|| cursor.advanced()));
        }
        match cursor.node().find_child(byte) {
            Some(child) => Ok(Some(Cursor::new(self.decode_child(child)?, 1))),
            None => Ok(None),
        }
    }

    /// Returns every cursor reachable by consuming one byte, with that byte, in
    /// ascending byte order.
    pub(crate) fn successors(&self, cursor: &Cursor) -> Result<Vec<(u8, Cursor)>> {
        if let Some(pending) = cursor.pending_byte() {
            return Ok(vec![(pending, cursor.advanced())]);
        }
        cursor
            .node()
            .children
            .iter()
            .map(|&child| Ok((child.first_byte, Cursor::new(self.decode_child(child)?, 1))))
            .collect()
    }

    /// Consumes all of `bytes` from `cursor`.
    pub(crate) fn follow(&self, cursor: &Cursor, bytes: &[u8]) -> Result<Option<Cursor>> {
        let mut cursor = cursor.clone();
        for &byte in bytes {
            match self.step(&cursor, byte)? {
                Some(next) => cursor = next,
                None => return Ok(None),
            }
        }
        Ok(Some(cursor))
    }

    /// Returns the token spelled by the path to `cursor` followed by `bytes`, if the
    /// index contains it.
    pub(crate) fn resolve(&self, cursor: &Cursor, bytes: &[u8]) -> Result<Option<TermEntry>> {
        Ok(self.follow(cursor, bytes)?.and_then(|c| c.term()))
    }
}
