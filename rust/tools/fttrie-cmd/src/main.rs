use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "fttrie-cmd")]
#[command(about = "Command-line utility for full-text trie indexes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by all commands that open an index.
#[derive(clap::Args)]
struct IndexArgs {
    /// Directory holding the index segment files
    index_dir: PathBuf,

    /// Segment name prefix
    #[arg(long, default_value = fttrie_index::DEFAULT_SEGMENT_PREFIX)]
    prefix: String,

    /// JSON file with the build flags of the index (stemming, case_sensitive, diacritics)
    #[arg(long)]
    meta: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Display index diagnostics: build flags, size and token frequencies
    Inspect {
        #[command(flatten)]
        index: IndexArgs,

        /// Number of most and least frequent tokens to list
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up a single token
    Search {
        #[command(flatten)]
        index: IndexArgs,

        /// Query token
        token: String,

        /// Match tokens within a bounded edit distance
        #[arg(long, conflicts_with = "wildcard")]
        fuzzy: bool,

        /// Interpret `.`, `.*`, `.+` and `.?` in the token as wildcards
        #[arg(long)]
        wildcard: bool,

        /// Maximum edit distance for fuzzy queries (0 = a quarter of the token length)
        #[arg(long, default_value_t = 0)]
        max_errors: u32,

        /// Skip position lists
        #[arg(long)]
        fast: bool,

        /// Print only the estimated posting count
        #[arg(long)]
        count: bool,

        /// Maximum number of postings to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Check the structural integrity of an index
    Verify {
        #[command(flatten)]
        index: IndexArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { index, top, json } => commands::inspect::run(&index, top, json),
        Commands::Search {
            index,
            token,
            fuzzy,
            wildcard,
            max_errors,
            fast,
            count,
            limit,
        } => {
            let flags = fttrie_index::QueryFlags {
                fuzzy,
                wildcard,
                fast,
                max_errors,
            };
            commands::search::run(&index, token, flags, count, limit)
        }
        Commands::Verify { index } => commands::verify::run(&index),
    }
}
