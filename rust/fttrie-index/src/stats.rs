//! Token frequency statistics and index diagnostics.

use std::{cmp::Reverse, collections::BinaryHeap, fmt};

use serde::Serialize;

use crate::options::BuildFlags;

/// Index kind reported by diagnostics.
pub const INDEX_KIND: &str = "compressed-trie";

/// A token with the number of its postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenFrequency {
    pub token: String,
    pub postings: u32,
}

/// Frequency summary over all tokens of an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenStats {
    pub token_count: u64,
    pub posting_count: u64,
    pub max_token_len: usize,
    /// Most frequent tokens, by descending posting count.
    pub most_frequent: Vec<TokenFrequency>,
    /// Least frequent tokens, by ascending posting count.
    pub least_frequent: Vec<TokenFrequency>,
}

/// Ranking key: posting count, ties broken by token bytes.
type Ranked = (u32, Reverse<Vec<u8>>);

/// Accumulates [`TokenStats`], keeping only the `top_k` most and least frequent tokens.
#[derive(Debug)]
pub struct TokenStatsCollector {
    top_k: usize,
    token_count: u64,
    posting_count: u64,
    max_token_len: usize,
    // min-heap: the root is the weakest of the current most frequent tokens
    most: BinaryHeap<Reverse<Ranked>>,
    // max-heap: the root is the strongest of the current least frequent tokens
    least: BinaryHeap<(u32, Vec<u8>)>,
}

impl TokenStatsCollector {
    pub fn new(top_k: usize) -> TokenStatsCollector {
        TokenStatsCollector {
            top_k,
            token_count: 0,
            posting_count: 0,
            max_token_len: 0,
            most: BinaryHeap::with_capacity(top_k + 1),
            least: BinaryHeap::with_capacity(top_k + 1),
        }
    }

    pub fn add(&mut self, token: &[u8], postings: u32) {
        self.token_count += 1;
        self.posting_count += postings as u64;
        self.max_token_len = self.max_token_len.max(token.len());
        if self.top_k == 0 {
            return;
        }

        let ranked = (postings, Reverse(token.to_vec()));
        if self.most.len() < self.top_k {
            self.most.push(Reverse(ranked));
        } else if self.most.peek().is_some_and(|Reverse(min)| ranked > *min) {
            self.most.pop();
            self.most.push(Reverse(ranked));
        }

        let entry = (postings, token.to_vec());
        if self.least.len() < self.top_k {
            self.least.push(entry);
        } else if self.least.peek().is_some_and(|max| entry < *max) {
            self.least.pop();
            self.least.push(entry);
        }
    }

    pub fn finish(self) -> TokenStats {
        let mut most: Vec<Ranked> = self.most.into_iter().map(|Reverse(r)| r).collect();
        most.sort_by(|a, b| b.cmp(a));
        let least = self.least.into_sorted_vec();
        TokenStats {
            token_count: self.token_count,
            posting_count: self.posting_count,
            max_token_len: self.max_token_len,
            most_frequent: most
                .into_iter()
                .map(|(postings, Reverse(token))| frequency(&token, postings))
                .collect(),
            least_frequent: least
                .into_iter()
                .map(|(postings, token)| frequency(&token, postings))
                .collect(),
        }
    }
}

fn frequency(token: &[u8], postings: u32) -> TokenFrequency {
    TokenFrequency {
        token: String::from_utf8_lossy(token).into_owned(),
        postings,
    }
}

/// Diagnostic summary of an open index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    pub kind: &'static str,
    pub flags: BuildFlags,
    pub node_count: u32,
    /// Combined size of the three segments in bytes.
    pub size_on_disk: u64,
    pub stats: TokenStats,
}

impl fmt::Display for IndexInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;
        writeln!(f, "- stemming: {}", on_off(self.flags.stemming))?;
        writeln!(f, "- case sensitivity: {}", on_off(self.flags.case_sensitive))?;
        writeln!(f, "- diacritics: {}", on_off(self.flags.diacritics))?;
        writeln!(f, "size on disk: {}", format_size(self.size_on_disk))?;
        writeln!(f, "nodes: {}", self.node_count)?;
        writeln!(f, "tokens: {}", self.stats.token_count)?;
        writeln!(f, "postings: {}", self.stats.posting_count)?;
        writeln!(f, "longest token: {} bytes", self.stats.max_token_len)?;
        write_frequencies(f, "most frequent", &self.stats.most_frequent)?;
        write_frequencies(f, "least frequent", &self.stats.least_frequent)
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "ON" } else { "OFF" }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn write_frequencies(f: &mut fmt::Formatter<'_>, title: &str, tokens: &[TokenFrequency]) -> fmt::Result {
    if tokens.is_empty() {
        return Ok(());
    }
    writeln!(f, "{title}:")?;
    for t in tokens {
        writeln!(f, "- {} ({}x)", t.token, t.postings)?;
    }
    Ok(())
}
