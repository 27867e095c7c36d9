//! Schema Type Definitions
//!
//! This crate contains the in-memory model of a message schema document:
//! the recursive type descriptor tree and the struct/field/document
//! containers built from it. It provides pure data structures with no file
//! I/O or code generation logic.

pub mod types;

// Re-export commonly used types at the crate root
pub use types::*;
