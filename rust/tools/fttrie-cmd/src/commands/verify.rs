//! Verify command implementation

use anyhow::{Context, Result, bail};
use fttrie_index::TrieIndexOptions;

use crate::{IndexArgs, commands::open_index};

pub fn run(args: &IndexArgs) -> Result<()> {
    let index = open_index(args, TrieIndexOptions::default())?;
    let report = index
        .verify_integrity()
        .context("Failed to scan the index")?;

    println!(
        "Checked {} nodes, {} tokens",
        report.node_count, report.token_count
    );
    if report.is_ok() {
        println!("No problems found");
        return Ok(());
    }
    for violation in &report.violations {
        println!("- {violation}");
    }
    bail!("{} integrity violations", report.violations.len())
}
