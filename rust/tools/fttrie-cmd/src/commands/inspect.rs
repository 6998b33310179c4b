//! Inspect command implementation

use anyhow::{Context, Result};
use fttrie_index::TrieIndexOptions;

use crate::{IndexArgs, commands::open_index};

pub fn run(args: &IndexArgs, top: usize, json: bool) -> Result<()> {
    let options = TrieIndexOptions {
        stats_top_k: top,
        ..Default::default()
    };
    let index = open_index(args, options)?;
    let info = index
        .diagnostics()
        .context("Failed to collect index diagnostics")?;

    if json {
        let json = serde_json::to_string_pretty(&info).context("Failed to serialize summary")?;
        println!("{json}");
    } else {
        print!("{info}");
    }
    Ok(())
}
