//! Remote Display Link Protocol
//!
//! This crate defines the framed command protocol spoken by a BASIC host
//! driving a remote framebuffer over a bit-banged parallel GPIO link. The
//! link has no flow control and no back channel, so the receiver decodes
//! byte by byte and silently resynchronizes on anything malformed.
//!
//! # Protocol Overview
//!
//! ```text
//! ┌──────────┬─────┬────────┬──────────────┬──────────┐
//! │ PREAMBLE │ CMD │ LENGTH │ PAYLOAD      │ CHECKSUM │
//! │ 3B 0xAA  │ 1B  │ 2B LE  │ 0–2983B      │ 1B       │
//! └──────────┴─────┴────────┴──────────────┴──────────┘
//! ```
//!
//! LENGTH is the total frame size, header and checksum included. The
//! checksum byte is chosen so that the XOR of every byte in the frame is
//! zero.

#![no_std]
#![deny(unsafe_code)]

pub mod color;
pub mod events;
pub mod frame;
pub mod messages;
pub mod reader;

pub use color::{Background, Rgb};
pub use events::LinkEvent;
pub use frame::{
    CommandKind, DecoderStats, Frame, FrameDecoder, FrameError, HEADER_LEN, MAX_FRAME_SIZE,
    MIN_FRAME_SIZE, PREAMBLE,
};
pub use messages::{DisplayCommand, MonoBitmap};
pub use reader::PayloadReader;
