//! Disk-resident full-text index over a prefix-compressed trie.
//!
//! The index maps text tokens to posting lists: for every document node a token occurs
//! in, the node's pre-order value and the token positions inside it. Tokens can be looked
//! up verbatim, with a wildcard operator or by bounded edit distance.
//!
//! # Layout
//!
//! - [`read`]: node decoding and the exact, wildcard and fuzzy trie searches
//! - [`postings`]: lazy posting iterators and their sorted union
//! - [`index`]: the [`TrieIndex`] facade tying segments, cache and searches together
//!
//! # Example
//!
//! ```no_run
//! use fttrie_index::{BuildFlags, FtQuery, TrieIndex, TrieIndexOptions};
//! use fttrie_io::DirectorySegmentStore;
//!
//! # fn main() -> fttrie_common::Result<()> {
//! let store = DirectorySegmentStore::new("/data/db");
//! let index = TrieIndex::open(&store, BuildFlags::default(), TrieIndexOptions::default())?;
//! for posting in index.search(&FtQuery::wildcard("colo.?r"))? {
//!     let posting = posting?;
//!     println!("{}: {:?}", posting.pre, posting.positions);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod index;
pub mod options;
pub mod postings;
pub mod query;
pub mod read;
pub mod stats;

pub use cache::{BoundedTokenCache, CachedTerm, TokenCache};
pub use index::TrieIndex;
pub use options::{BuildFlags, TrieIndexOptions};
pub use postings::{Posting, PostingIterator, union, union_all};
pub use query::{FtQuery, QueryFlags, QueryMode};
pub use read::integrity::IntegrityReport;
pub use stats::{IndexInfo, TokenFrequency, TokenStats};

/// Default name prefix of the index segments.
pub const DEFAULT_SEGMENT_PREFIX: &str = "ftx";
