//! Search command implementation

use anyhow::{Context, Result};
use fttrie_index::{FtQuery, Posting, QueryFlags, TrieIndex, TrieIndexOptions};

use crate::{IndexArgs, commands::open_index};

pub fn run(
    args: &IndexArgs,
    token: String,
    flags: QueryFlags,
    count: bool,
    limit: Option<usize>,
) -> Result<()> {
    let query = FtQuery::from_flags(token, flags)?;
    let index = open_index(args, TrieIndexOptions::default())?;

    if count {
        println!("{}", index.estimate_count(&query)?);
        return Ok(());
    }

    let (postings, total) = collect(&index, &query, limit)?;
    for posting in &postings {
        if posting.positions.is_empty() {
            println!("{}", posting.pre);
        } else {
            println!("{}: {:?}", posting.pre, posting.positions);
        }
    }
    if total > postings.len() {
        println!("... {} more", total - postings.len());
    }
    println!("{total} postings");
    Ok(())
}

/// Runs `query`, keeping at most `limit` postings. Returns the kept postings and the
/// total count.
fn collect(index: &TrieIndex, query: &FtQuery, limit: Option<usize>) -> Result<(Vec<Posting>, usize)> {
    let limit = limit.unwrap_or(usize::MAX);
    let mut kept = Vec::new();
    let mut total = 0;
    for posting in index.search(query).context("Search failed")? {
        let posting = posting.context("Failed to read postings")?;
        if kept.len() < limit {
            kept.push(posting);
        }
        total += 1;
    }
    Ok((kept, total))
}
