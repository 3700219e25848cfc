//! Small, reusable helpers used across the crate.
//!
//! Hex formatting feeds the worker's wire-level debug logging; the byte
//! helpers centralize the big-endian 16-bit fields that appear in every
//! protocol layer.

pub mod bytes;
pub mod hex;

pub use bytes::*;
pub use hex::*;
