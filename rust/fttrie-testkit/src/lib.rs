//! Test utilities and helpers for the fttrie crates.
//!
//! This crate provides:
//! - A fixture writer that lays out a token vocabulary as the three trie index
//!   segments (node stream, posting stream, offsets)
//! - Vocabulary generators for building synthetic test indexes
//!
//! # Usage
//!
//! This crate is intended for the fttrie test suites and development tools. It is not a
//! production index builder: it keeps the whole vocabulary in memory and writes it in one go.

pub mod trie_writer;
pub mod vocab;

pub use trie_writer::{TrieIndexWriter, TrieSegments};
