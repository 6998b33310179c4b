//! Literal descent from the root.

use fttrie_common::Result;

use crate::read::{
    cursor::Cursor,
    node::{TrieDecoder, TrieNode},
};

impl TrieDecoder {
    /// Finds the node whose root path spells exactly `token`.
    ///
    /// The node is returned even when no token ends there (`posting_size == 0`), which
    /// happens when `token` is a branching prefix of longer tokens. Returns `None` for an
    /// empty token or when the path leaves the trie.
    pub fn find_exact(&self, token: &[u8]) -> Result<Option<TrieNode>> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self
            .descend(token)?
            .filter(Cursor::at_boundary)
            .map(|cursor| cursor.node().clone()))
    }

    /// Follows `prefix` from the root, matching whole labels at a time.
    ///
    /// Unlike [`TrieDecoder::find_exact`], the prefix may end inside a label; the returned
    /// cursor then points at the first unmatched label byte. An empty prefix yields the
    /// root cursor.
    pub(crate) fn descend(&self, prefix: &[u8]) -> Result<Option<Cursor>> {
        let mut node = self.root()?;
        let mut rest = prefix;
        loop {
            let label_len = node.label.len();
            let common = node
                .label
                .iter()
                .zip(rest)
                .take_while(|(a, b)| a == b)
                .count();
            if common < label_len {
                return Ok((common == rest.len()).then(|| Cursor::new(node, common)));
            }

            rest = &rest[label_len..];
            let Some(&next) = rest.first() else {
                return Ok(Some(Cursor::at_end(node)));
            };
            let Some(child) = node.find_child(next) else {
                return Ok(None);
            };
            node = self.decode_child(child)?;
        }
    }
}
