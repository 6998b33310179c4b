//! Fuzzy (bounded edit-distance) search.
//!
//! The search walks the trie and the query side by side. Wherever the next trie byte and
//! the next query byte disagree, it branches into the three Levenshtein edits while the
//! edit budget lasts:
//!
//! - **delete** the query byte,
//! - **insert** the trie byte in front of the query,
//! - **replace** the query byte with the trie byte.
//!
//! Agreeing bytes are always matched without branching: for any pair of strings starting
//! with the same byte, matching it never costs more than editing it.

use fttrie_common::Result;

use crate::read::{MatchSet, cursor::Cursor, node::TrieDecoder};

/// Edits applied along one search path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Edits {
    pub deletions: u32,
    pub insertions: u32,
    pub replacements: u32,
}

impl Edits {
    pub fn total(&self) -> u32 {
        self.deletions + self.insertions + self.replacements
    }

    fn deleted(self) -> Edits {
        Edits {
            deletions: self.deletions + 1,
            ..self
        }
    }

    fn inserted(self) -> Edits {
        Edits {
            insertions: self.insertions + 1,
            ..self
        }
    }

    fn replaced(self) -> Edits {
        Edits {
            replacements: self.replacements + 1,
            ..self
        }
    }
}

/// Default edit budget for a query of `len` bytes: one edit per four bytes.
pub fn default_max_errors(len: usize) -> u32 {
    (len / 4) as u32
}

impl TrieDecoder {
    /// Returns all tokens within Levenshtein distance `max_errors` of `query`.
    pub fn fuzzy_search(&self, query: &[u8], max_errors: u32) -> Result<MatchSet> {
        let mut matches = MatchSet::new();
        let search = FuzzySearch {
            decoder: self,
            max_errors,
        };
        search.visit(Cursor::at_end(self.root()?), query, Edits::default(), &mut matches)?;
        Ok(matches)
    }
}

struct FuzzySearch<'a> {
    decoder: &'a TrieDecoder,
    max_errors: u32,
}

impl FuzzySearch<'_> {
    /// Explores all alignments of the tokens below `cursor` with `query`.
    ///
    /// Callers guarantee `edits.total() <= max_errors`; a branch that would exceed the
    /// budget is never entered.
    fn visit(&self, cursor: Cursor, query: &[u8], edits: Edits, matches: &mut MatchSet) -> Result<()> {
        let (cursor, query) = agree(cursor, query);
        let can_edit = edits.total() < self.max_errors;

        if query.is_empty() {
            if let Some(term) = cursor.term() {
                matches.insert(term);
            }
            // trailing insertions extend the token past the end of the query
            if can_edit {
                for (_, next) in self.decoder.successors(&cursor)? {
                    self.visit(next, query, edits.inserted(), matches)?;
                }
            }
            return Ok(());
        }

        for (byte, next) in self.decoder.successors(&cursor)? {
            if byte == query[0] {
                self.visit(next, &query[1..], edits, matches)?;
            } else if can_edit {
                self.visit(next.clone(), &query[1..], edits.replaced(), matches)?;
                self.visit(next, query, edits.inserted(), matches)?;
            }
        }
        if can_edit {
            self.visit(cursor, &query[1..], edits.deleted(), matches)?;
        }
        Ok(())
    }
}

/// Consumes the label bytes at `cursor` that agree with the head of `query`.
fn agree(mut cursor: Cursor, mut query: &[u8]) -> (Cursor, &[u8]) {
    while let (Some(pending), Some(&next)) = (cursor.pending_byte(), query.first()) {
        if pending != next {
            break;
        }
        cursor = cursor.advanced();
        query = &query[1..];
    }
    (cursor, query)
}
