//! Pixel surface and raster compositor for pixlink
//!
//! This crate provides:
//! - `PixelSurface` over caller-provided storage with dirty-rect tracking
//! - `Compositor` executing decoded drawing commands with clipping
//! - `DisplayFlush` trait for pushing changed regions to a panel
//!
//! # Architecture
//!
//! The compositor never talks to hardware. It writes into the surface and
//! grows the dirty rectangle; whoever owns the pipeline decides when to hand
//! `view()` and the dirty region to a `DisplayFlush` implementation.
//!
//! ```text
//! DisplayCommand ──▶ Compositor ──▶ PixelSurface ──▶ DisplayFlush
//!                                   (dirty rect)
//! ```

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod backend;
pub mod compositor;
pub mod rect;
pub mod surface;

// Re-export key types
pub use backend::{DisplayFlush, FlushError};
pub use compositor::Compositor;
pub use rect::Rect;
pub use surface::{FrameView, PixelSurface, SurfaceError, BYTES_PER_PIXEL};
