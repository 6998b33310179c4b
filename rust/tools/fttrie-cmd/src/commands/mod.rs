//! Command implementations for fttrie-cmd

use std::path::Path;

use anyhow::{Context, Result};
use fttrie_index::{BuildFlags, TrieIndex, TrieIndexOptions};
use fttrie_io::DirectorySegmentStore;

use crate::{IndexArgs, utils::validate_dir_exists};

pub mod inspect;
pub mod search;
pub mod verify;

/// Opens the index described by `args` with the given options, taking the segment
/// prefix from the arguments.
pub fn open_index(args: &IndexArgs, options: TrieIndexOptions) -> Result<TrieIndex> {
    validate_dir_exists(&args.index_dir)?;
    let flags = match &args.meta {
        Some(path) => load_flags(path)?,
        None => BuildFlags::default(),
    };
    let options = TrieIndexOptions {
        segment_prefix: args.prefix.clone(),
        ..options
    };
    let store = DirectorySegmentStore::new(&args.index_dir);
    TrieIndex::open(&store, flags, options)
        .with_context(|| format!("Failed to open index in {}", args.index_dir.display()))
}

/// Reads build flags from a JSON file.
pub fn load_flags(path: &Path) -> Result<BuildFlags> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid build flags in {}", path.display()))
}
