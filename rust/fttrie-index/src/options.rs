//! Index configuration.

use serde::{Deserialize, Serialize};

use crate::DEFAULT_SEGMENT_PREFIX;

/// Runtime options of a [`TrieIndex`](crate::TrieIndex).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrieIndexOptions {
    /// Fuzzy edit budget used when a query does not set its own. 0 derives the budget
    /// from the token length.
    pub max_errors: u32,
    /// Maximum number of plain tokens kept in the lookup cache. 0 disables caching.
    pub cache_capacity: usize,
    /// Number of most frequent tokens reported by diagnostics.
    pub stats_top_k: usize,
    /// Name prefix of the three index segments.
    pub segment_prefix: String,
}

impl Default for TrieIndexOptions {
    fn default() -> Self {
        TrieIndexOptions {
            max_errors: 0,
            cache_capacity: 10_000,
            stats_top_k: 10,
            segment_prefix: DEFAULT_SEGMENT_PREFIX.to_string(),
        }
    }
}

impl TrieIndexOptions {
    pub fn nodes_segment(&self) -> String {
        format!("{}a", self.segment_prefix)
    }

    pub fn postings_segment(&self) -> String {
        format!("{}b", self.segment_prefix)
    }

    pub fn offsets_segment(&self) -> String {
        format!("{}c", self.segment_prefix)
    }
}

/// Tokenizer settings the index was built with.
///
/// The trie stores tokens as they came out of the tokenizer; these flags only tell the
/// host how to normalize query tokens so that they match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildFlags {
    pub stemming: bool,
    pub case_sensitive: bool,
    pub diacritics: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults_fill_missing_fields() {
        let options: TrieIndexOptions = serde_json::from_str(r#"{"max_errors": 2}"#).unwrap();
        assert_eq!(options.max_errors, 2);
        assert_eq!(options.cache_capacity, 10_000);
        assert_eq!(options.stats_top_k, 10);
        assert_eq!(options.offsets_segment(), "ftxc");
    }

    #[test]
    fn test_segment_names_follow_prefix() {
        let options = TrieIndexOptions {
            segment_prefix: "idx_".to_string(),
            ..Default::default()
        };
        assert_eq!(options.nodes_segment(), "idx_a");
        assert_eq!(options.postings_segment(), "idx_b");
    }

    #[test]
    fn test_build_flags_json() {
        let flags: BuildFlags = serde_json::from_str(r#"{"case_sensitive": true}"#).unwrap();
        assert!(flags.case_sensitive && !flags.stemming && !flags.diacritics);
    }
}
