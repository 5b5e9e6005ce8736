//! Configuration types
//!
//! Board-agnostic link setup, optionally stored as postcard binary data.

pub mod types;

pub use types::*;
