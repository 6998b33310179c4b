//! Core definitions (error types and helper macros), relied upon by all fttrie-* crates.

pub mod error;
pub mod macros;
pub mod result;

pub use result::Result;
