//! Enumeration of every token stored in the trie.

use fttrie_common::Result;

use crate::read::node::{ROOT, TrieDecoder, TrieNode};

impl TrieDecoder {
    /// Calls `f` with every token and the node it ends at, in ascending byte order.
    ///
    /// # Errors
    ///
    /// Fails with a format error if a node is reached twice, which only happens when
    /// child references loop back or are shared.
    pub fn for_each_token<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&[u8], &TrieNode),
    {
        // (node id, length of the parent path)
        let mut stack = vec![(ROOT, 0usize)];
        let mut path = Vec::new();
        let mut visited = self.visited_nodes();
        while let Some((id, depth)) = stack.pop() {
            visited.enter(id)?;
            let node = self.decode_node(id)?;
            path.truncate(depth);
            path.extend_from_slice(&node.label);
            if node.has_postings() {
                f(&path, &node);
            }
            let depth = path.len();
            stack.extend(node.children.iter().rev().map(|c| (c.id, depth)));
        }
        Ok(())
    }

    /// Collects every token in ascending byte order.
    pub fn tokens(&self) -> Result<Vec<Vec<u8>>> {
        let mut tokens = Vec::new();
        self.for_each_token(|token, _| tokens.push(token.to_vec()))?;
        Ok(tokens)
    }
}
