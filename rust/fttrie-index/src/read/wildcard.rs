//! Wildcard search.
//!
//! A wildcard token contains a marker byte `.` optionally followed by a modifier:
//!
//! | Pattern | Meaning                     |
//! |---------|-----------------------------|
//! | `.`     | exactly one byte            |
//! | `.*`    | zero or more bytes          |
//! | `.+`    | one or more bytes           |
//! | `.?`    | zero or one byte            |
//!
//! Only the first marker is interpreted; the text after the operator is matched literally.

use fttrie_common::Result;

use crate::read::{MatchSet, cursor::Cursor, node::TrieDecoder};

/// The wildcard marker byte.
pub const MARKER: u8 = b'.';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardOp {
    /// `.`
    AnyOne,
    /// `.*`
    ZeroOrMore,
    /// `.+`
    OneOrMore,
    /// `.?`
    ZeroOrOne,
}

/// A token split around its wildcard operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WildcardPattern<'a> {
    pub prefix: &'a [u8],
    pub op: WildcardOp,
    pub suffix: &'a [u8],
}

impl<'a> WildcardPattern<'a> {
    /// Splits `token` at its first marker byte. Returns `None` if there is no marker.
    pub fn parse(token: &'a [u8]) -> Option<WildcardPattern<'a>> {
        let pos = token.iter().position(|&b| b == MARKER)?;
        let (op, op_len) = match token.get(pos + 1) {
            Some(b'*') => (WildcardOp::ZeroOrMore, 2),
            Some(b'+') => (WildcardOp::OneOrMore, 2),
            Some(b'?') => (WildcardOp::ZeroOrOne, 2),
            _ => (WildcardOp::AnyOne, 1),
        };
        Some(WildcardPattern {
            prefix: &token[..pos],
            op,
            suffix: &token[pos + op_len..],
        })
    }
}

impl TrieDecoder {
    /// Returns all tokens matching `pattern`.
    pub fn wildcard_search(&self, pattern: &WildcardPattern<'_>) -> Result<MatchSet> {
        let mut matches = MatchSet::new();
        let Some(start) = self.descend(pattern.prefix)? else {
            return Ok(matches);
        };

        match pattern.op {
            WildcardOp::AnyOne => self.match_any_one(&start, pattern.suffix, &mut matches)?,
            WildcardOp::ZeroOrOne => {
                if let Some(term) = self.resolve(&start, pattern.suffix)? {
                    matches.insert(term);
                }
                self.match_any_one(&start, pattern.suffix, &mut matches)?;
            }
            WildcardOp::ZeroOrMore => self.match_any_run(start, true, pattern.suffix, &mut matches)?,
            WildcardOp::OneOrMore => self.match_any_run(start, false, pattern.suffix, &mut matches)?,
        }
        Ok(matches)
    }

    /// Substitutes every possible byte for the wildcard and continues with `suffix`.
    fn match_any_one(&self, start: &Cursor, suffix: &[u8], matches: &mut MatchSet) -> Result<()> {
        for (_, next) in self.successors(start)? {
            if let Some(term) = self.resolve(&next, suffix)? {
                matches.insert(term);
            }
        }
        Ok(())
    }

    /// Tries `suffix` from every position reachable from `start`, in preorder.
    ///
    /// Every node below `start` is decoded once: the successors decoded for the walk
    /// also serve the first byte of `suffix`.
    fn match_any_run(
        &self,
        start: Cursor,
        include_start: bool,
        suffix: &[u8],
        matches: &mut MatchSet,
    ) -> Result<()> {
        let mut visited = self.visited_nodes();
        visited.enter(start.node().id)?;
        // (position, whether `suffix` is tried from it)
        let mut stack = vec![(start, include_start)];
        while let Some((cursor, try_suffix)) = stack.pop() {
            let successors = self.successors(&cursor)?;
            if try_suffix {
                let term = match suffix.split_first() {
                    None => cursor.term(),
                    Some((first, rest)) => match successors.iter().find(|(b, _)| b == first) {
                        Some((_, after)) => self.resolve(after, rest)?,
                        None => None,
                    },
                };
                if let Some(term) = term {
                    matches.insert(term);
                }
            }
            let enters_children = cursor.at_boundary();
            for (_, child) in successors.into_iter().rev() {
                if enters_children {
                    visited.enter(child.node().id)?;
                }
                stack.push((child, true));
            }
        }
        Ok(())
    }
}
