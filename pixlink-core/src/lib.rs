//! Board-agnostic core logic for the pixlink display link
//!
//! This crate contains the pipeline that does not depend on specific
//! hardware implementations:
//!
//! - Link configuration (panel geometry, frame limit, flush policy)
//! - `DisplayLink`: decoder, compositor and flush sink wired together
//!
//! The embedding supplies a `LinkSource` for received bytes, storage for
//! the pixel surface and a `DisplayFlush` for the panel.

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod link;

pub use config::{ConfigError, FlushPolicy, LinkConfig};
pub use link::{DisplayLink, LinkError, LinkStats};
