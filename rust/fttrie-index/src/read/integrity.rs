//! Full-trie structural verification.

use fttrie_common::Result;
use serde::Serialize;

use crate::read::node::{ROOT, TrieDecoder, TrieNode};

/// Outcome of [`TrieDecoder::check_integrity`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub node_count: u32,
    /// Number of reachable nodes with postings.
    pub token_count: u64,
    /// Human-readable descriptions of every violated invariant.
    pub violations: Vec<String>,
}

impl IntegrityReport {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }
}

impl TrieDecoder {
    /// Walks the whole trie from the root and checks the on-disk invariants:
    ///
    /// - every node decodes, and only the root has an empty label;
    /// - children are strictly ascending by first byte, refer to valid ids and agree with
    ///   the first byte of the child's label;
    /// - every non-root node is referenced exactly once;
    /// - the pre-value range of every posting list lies within `postings_len` bytes;
    /// - no non-root node is a pass-through (one child, no postings) or an empty leaf.
    ///
    /// Format problems are collected into the report instead of failing the scan; I/O
    /// errors abort it.
    pub fn check_integrity(&self, postings_len: u64) -> Result<IntegrityReport> {
        let node_count = self.node_count();
        let mut report = IntegrityReport {
            node_count,
            ..Default::default()
        };
        let mut referenced = vec![false; node_count as usize];
        referenced[ROOT as usize] = true;

        // (node id, first label byte announced by the parent)
        let mut stack = vec![(ROOT, None)];
        while let Some((id, first_byte)) = stack.pop() {
            let node = match self.decode_node(id) {
                Ok(node) => node,
                Err(e) if e.is_integrity() => {
                    report.violate(format!("node {id}: {e}"));
                    continue;
                }
                Err(e) => return Err(e),
            };

            check_label(&node, first_byte, &mut report);
            check_postings(&node, postings_len, &mut report);
            if node.has_postings() {
                report.token_count += 1;
            }

            let mut prev_byte = None;
            for child in node.children.iter().rev() {
                if prev_byte.is_some_and(|prev| child.first_byte >= prev) {
                    report.violate(format!("node {id}: children not strictly ascending"));
                }
                prev_byte = Some(child.first_byte);

                if child.id == ROOT || child.id >= node_count {
                    report.violate(format!("node {id}: child id {} out of range", child.id));
                    continue;
                }
                let seen = &mut referenced[child.id as usize];
                if *seen {
                    report.violate(format!("node {}: referenced more than once", child.id));
                    continue;
                }
                *seen = true;
                stack.push((child.id, Some(child.first_byte)));
            }
        }

        let unreachable = referenced.iter().filter(|&&r| !r).count();
        if unreachable > 0 {
            report.violate(format!("{unreachable} nodes unreachable from the root"));
        }
        Ok(report)
    }
}

impl IntegrityReport {
    fn violate(&mut self, message: String) {
        log::warn!("trie integrity: {message}");
        self.violations.push(message);
    }
}

fn check_label(node: &TrieNode, first_byte: Option<u8>, report: &mut IntegrityReport) {
    let id = node.id;
    if node.is_root() {
        if !node.label.is_empty() {
            report.violate("root label is not empty".to_string());
        }
        return;
    }
    if node.label.is_empty() {
        report.violate(format!("node {id}: empty label"));
    } else if first_byte.is_some_and(|b| node.label[0] != b) {
        report.violate(format!("node {id}: label does not start with the parent's child byte"));
    }
    if !node.has_postings() {
        if node.is_leaf() {
            report.violate(format!("node {id}: leaf without postings"));
        } else if node.children.len() == 1 {
            report.violate(format!("node {id}: single-child node without postings"));
        }
    }
}

fn check_postings(node: &TrieNode, postings_len: u64, report: &mut IntegrityReport) {
    if !node.has_postings() {
        return;
    }
    let end = node.posting_pointer + node.posting_size as u64 * 4;
    if end > postings_len {
        report.violate(format!(
            "node {}: posting range {}..{end} exceeds posting stream of {postings_len} bytes",
            node.id, node.posting_pointer
        ));
    }
}
