//! Index facade: query dispatch, caching, diagnostics and lifecycle.

use std::sync::Arc;

use fttrie_common::{Result, error::Error};
use fttrie_io::{Segment, SegmentStore};

use crate::{
    cache::{BoundedTokenCache, CachedTerm, TokenCache},
    options::{BuildFlags, TrieIndexOptions},
    postings::{PostingIterator, PostingStream, union_all},
    query::{FtQuery, QueryMode},
    read::{
        MatchSet,
        fuzzy::default_max_errors,
        integrity::IntegrityReport,
        node::{TrieDecoder, TrieNode},
        wildcard::WildcardPattern,
    },
    stats::{INDEX_KIND, IndexInfo, TokenStatsCollector},
};

/// Read-only full-text index over a compressed trie.
///
/// The index is backed by three segments opened from a [`SegmentStore`]:
/// - **node stream** (`<prefix>a`): label, child list and posting footer of every node
/// - **posting stream** (`<prefix>b`): pre-values and position lists
/// - **offsets** (`<prefix>c`): start of every node entry within the node stream
///
/// # Queries
///
/// A query is a single token in one of three modes (see [`FtQuery`]):
/// - **Exact**: the token is looked up verbatim, with results cached per token
/// - **Wildcard**: the first `.` of the token is a wildcard operator; a token without one
///   is answered as an exact query
/// - **Fuzzy**: all tokens within a bounded Levenshtein distance match
///
/// Every lookup returns a [`PostingIterator`] ascending by pre-value. When several tokens
/// match, their postings are merged and positions for a shared pre-value are combined.
///
/// # Concurrency
///
/// Segment reads are positioned and keep no shared cursor, so queries take `&self` and
/// may run concurrently from several threads. [`TrieIndex::close`] takes `&mut self`.
/// Iterators returned before closing hold their own handle on the posting stream and
/// remain usable.
pub struct TrieIndex {
    segments: Option<IndexSegments>,
    flags: BuildFlags,
    options: TrieIndexOptions,
    cache: Arc<dyn TokenCache>,
}

struct IndexSegments {
    decoder: TrieDecoder,
    postings: Segment,
}

impl TrieIndex {
    /// Opens the index segments named by `options.segment_prefix`.
    ///
    /// `flags` describes how the index was built; it is reported by
    /// [`TrieIndex::diagnostics`] and does not affect lookups.
    ///
    /// # Errors
    ///
    /// Fails if a segment cannot be opened or the offsets segment is malformed.
    pub fn open(
        store: &dyn SegmentStore,
        flags: BuildFlags,
        options: TrieIndexOptions,
    ) -> Result<TrieIndex> {
        let offsets = store.open_segment(&options.offsets_segment())?;
        let nodes = store.open_segment(&options.nodes_segment())?;
        let postings = store.open_segment(&options.postings_segment())?;
        let decoder = TrieDecoder::new(offsets, nodes)?;
        log::debug!(
            "opened trie index '{}': {} nodes, {} bytes",
            options.segment_prefix,
            decoder.node_count(),
            decoder.size_on_disk() + postings.len()
        );
        let cache = Arc::new(BoundedTokenCache::new(options.cache_capacity));
        Ok(TrieIndex {
            segments: Some(IndexSegments { decoder, postings }),
            flags,
            options,
            cache,
        })
    }

    /// Replaces the default token cache, e.g. to share one cache between several
    /// handles of the same index.
    pub fn with_cache(mut self, cache: Arc<dyn TokenCache>) -> TrieIndex {
        self.cache = cache;
        self
    }

    pub fn flags(&self) -> BuildFlags {
        self.flags
    }

    pub fn options(&self) -> &TrieIndexOptions {
        &self.options
    }

    pub fn is_closed(&self) -> bool {
        self.segments.is_none()
    }

    /// Estimated number of postings `query` yields.
    ///
    /// Exact for plain tokens. Wildcard and fuzzy queries span several index entries and
    /// always report 1. An empty token reports 0.
    pub fn estimate_count(&self, query: &FtQuery) -> Result<u32> {
        let segments = self.segments()?;
        if query.mode() != QueryMode::Exact {
            return Ok(1);
        }
        if query.token().is_empty() {
            return Ok(0);
        }
        Ok(self.lookup_plain(segments, query.token())?.size)
    }

    /// Runs `query` and returns its postings.
    ///
    /// An empty token, or a token the index does not contain, yields an empty iterator.
    ///
    /// # Errors
    ///
    /// Fails on a closed index and on storage or format errors hit while walking the
    /// trie. Errors while reading postings surface as `Err` items of the iterator.
    pub fn search(&self, query: &FtQuery) -> Result<PostingIterator> {
        let segments = self.segments()?;
        let token = query.token();
        if token.is_empty() {
            return Ok(PostingIterator::Empty);
        }

        let fast = query.is_fast();
        let postings = match query.mode() {
            QueryMode::Fuzzy => {
                let max_errors = self.max_errors(query);
                segments.postings_for(segments.decoder.fuzzy_search(token, max_errors)?, fast)
            }
            QueryMode::Wildcard => match WildcardPattern::parse(token) {
                Some(pattern) => {
                    segments.postings_for(segments.decoder.wildcard_search(&pattern)?, fast)
                }
                None => self.exact_postings(segments, token, fast)?,
            },
            QueryMode::Exact => self.exact_postings(segments, token, fast)?,
        };
        log::trace!(
            "{:?} query {:?} done",
            query.mode(),
            String::from_utf8_lossy(token)
        );
        Ok(postings)
    }

    /// Finds the node spelling exactly `token`, whether or not a token ends there.
    pub fn find_exact(&self, token: &[u8]) -> Result<Option<TrieNode>> {
        self.segments()?.decoder.find_exact(token)
    }

    /// Every token of the index with its posting count, in ascending byte order.
    pub fn tokens(&self) -> Result<Vec<(Vec<u8>, u32)>> {
        let mut tokens = Vec::new();
        self.segments()?
            .decoder
            .for_each_token(|token, node| tokens.push((token.to_vec(), node.posting_size)))?;
        Ok(tokens)
    }

    /// Summarizes the index: build flags, size on disk and token frequencies.
    ///
    /// Walks the whole trie.
    pub fn diagnostics(&self) -> Result<IndexInfo> {
        let segments = self.segments()?;
        let mut collector = TokenStatsCollector::new(self.options.stats_top_k);
        segments
            .decoder
            .for_each_token(|token, node| collector.add(token, node.posting_size))?;
        Ok(IndexInfo {
            kind: INDEX_KIND,
            flags: self.flags,
            node_count: segments.decoder.node_count(),
            size_on_disk: segments.decoder.size_on_disk() + segments.postings.len(),
            stats: collector.finish(),
        })
    }

    /// Checks the structural invariants of the whole trie.
    pub fn verify_integrity(&self) -> Result<IntegrityReport> {
        let segments = self.segments()?;
        let report = segments.decoder.check_integrity(segments.postings.len())?;
        log::debug!(
            "integrity scan of '{}': {} nodes, {} violations",
            self.options.segment_prefix,
            report.node_count,
            report.violations.len()
        );
        Ok(report)
    }

    /// Releases the index segments and clears the token cache.
    ///
    /// Closing an already closed index does nothing. Subsequent queries fail with an
    /// invalid-operation error.
    pub fn close(&mut self) {
        if self.segments.take().is_some() {
            self.cache.clear();
            log::debug!("closed trie index '{}'", self.options.segment_prefix);
        }
    }

    fn segments(&self) -> Result<&IndexSegments> {
        self.segments
            .as_ref()
            .ok_or_else(|| Error::invalid_operation("query on a closed trie index"))
    }

    /// Fuzzy budget: the query override, then the configured default, then a quarter
    /// of the token length.
    fn max_errors(&self, query: &FtQuery) -> u32 {
        if query.max_errors() > 0 {
            query.max_errors()
        } else if self.options.max_errors > 0 {
            self.options.max_errors
        } else {
            default_max_errors(query.token().len())
        }
    }

    fn exact_postings(
        &self,
        segments: &IndexSegments,
        token: &[u8],
        fast: bool,
    ) -> Result<PostingIterator> {
        let term = self.lookup_plain(segments, token)?;
        if term.size == 0 {
            return Ok(PostingIterator::Empty);
        }
        let stream = PostingStream::new(segments.postings.clone(), term.pointer, term.size, fast);
        Ok(stream.into())
    }

    /// Exact lookup through the token cache. Misses are cached too, with size 0.
    fn lookup_plain(&self, segments: &IndexSegments, token: &[u8]) -> Result<CachedTerm> {
        if let Some(cached) = self.cache.lookup(token) {
            return Ok(cached);
        }
        let term = segments
            .decoder
            .find_exact(token)?
            .and_then(|node| node.term())
            .map_or(CachedTerm { size: 0, pointer: 0 }, |t| CachedTerm {
                size: t.posting_size,
                pointer: t.posting_pointer,
            });
        self.cache.insert(token, term);
        Ok(term)
    }
}

impl IndexSegments {
    fn postings_for(&self, matches: MatchSet, fast: bool) -> PostingIterator {
        log::trace!("merging postings of {} tokens", matches.len());
        union_all(
            matches
                .into_entries()
                .into_iter()
                .map(|term| PostingStream::for_term(self.postings.clone(), &term, fast).into()),
        )
    }
}

impl std::fmt::Debug for TrieIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrieIndex")
            .field("prefix", &self.options.segment_prefix)
            .field("flags", &self.flags)
            .field("closed", &self.is_closed())
            .finish()
    }
}
