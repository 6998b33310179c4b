//! Vocabulary generators for synthetic trie indexes.

use std::ops::Range;

use crate::TrieIndexWriter;

/// A small English vocabulary with shared prefixes, near-duplicates and spelling variants.
pub const SAMPLE_WORDS: &[&str] = &[
    "cat", "cot", "cut", "cup", "color", "colour", "kitten", "sitting", "mitten", "bitten",
    "kit", "kite", "kitchen", "tree", "trie", "try", "trip", "tripod", "a", "an", "and", "ant",
];

/// Builds a writer where word `i` has a single posting with pre-value `i` and position `0`.
///
/// Pre-values thus map search results back to the words that produced them.
pub fn writer_for_words<S: AsRef<str>>(words: &[S]) -> TrieIndexWriter {
    let mut writer = TrieIndexWriter::new();
    for (i, word) in words.iter().enumerate() {
        writer.add(word.as_ref(), i as u32, &[0]);
    }
    writer
}

/// Generates `count` distinct random words over `alphabet` with lengths drawn from `len`.
///
/// The result is sorted and deterministic for a given `seed`.
pub fn random_vocabulary(seed: u64, count: usize, alphabet: &[u8], len: Range<usize>) -> Vec<String> {
    assert!(!alphabet.is_empty());
    assert!(len.start > 0 && len.start < len.end);
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut words = std::collections::BTreeSet::new();
    let mut attempts = 0;
    while words.len() < count && attempts < count * 100 {
        attempts += 1;
        let n = rng.usize(len.clone());
        let word: String = (0..n)
            .map(|_| alphabet[rng.usize(..alphabet.len())] as char)
            .collect();
        words.insert(word);
    }
    words.into_iter().collect()
}
