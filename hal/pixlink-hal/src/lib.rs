//! pixlink Hardware Abstraction Layer
//!
//! This crate defines the seam between the link hardware and the decoding
//! pipeline. On a board, the byte source is a tight GPIO polling loop that
//! samples the data lines on every strobe edge and watches the reset line;
//! on a host it can be a capture file or an in-memory buffer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  pixlink-core (DisplayLink pipeline)    │
//! └─────────────────────────────────────────┘
//!                     │ LinkEvent
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pixlink-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ GPIO sampler  │       │ capture file  │
//! │  (board)      │       │  (host)       │
//! └───────────────┘       └───────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod link;

pub use link::{IterSource, LinkSource};
