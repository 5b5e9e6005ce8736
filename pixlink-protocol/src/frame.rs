//! Frame encoding and decoding for the remote display link.
//!
//! Frame format:
//! - PREAMBLE (3 bytes): 0xAA 0xAA 0xAA
//! - CMD (1 byte): one of the [`CommandKind`] codes
//! - LENGTH (2 bytes): little-endian total frame length, header included
//! - PAYLOAD (LENGTH - 7 bytes): command-specific data
//! - CHECKSUM (1 byte): makes the XOR of every frame byte zero
//!
//! There is no byte stuffing. A payload that happens to contain
//! `AA AA AA <cmd>` can trigger a false sync after a lost byte; the decoder
//! only recovers by running into a bad length or checksum.

use heapless::Vec;

/// Frame synchronization byte
pub const PREAMBLE: u8 = 0xAA;

/// Number of preamble bytes before the command code
pub const PREAMBLE_LEN: usize = 3;

/// PREAMBLE + CMD + LENGTH
pub const HEADER_LEN: usize = 6;

/// Maximum total frame size in bytes
pub const MAX_FRAME_SIZE: usize = 2990;

/// Smallest legal frame: header plus checksum, empty payload
pub const MIN_FRAME_SIZE: usize = HEADER_LEN + 1;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - MIN_FRAME_SIZE;

/// Errors from building frames or reading their payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Payload ended before a field was complete
    Truncated,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Command codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    FillRect,
    DrawBitmap,
    BlitBuffer,
    ScrollBuffer,
    /// Accepted by the decoder, ignored by the compositor
    ExecuteOpaque,
}

const CMD_FILL_RECT: u8 = 0x11;
const CMD_DRAW_BITMAP: u8 = 0x22;
const CMD_BLIT_BUFFER: u8 = 0x33;
const CMD_SCROLL_BUFFER: u8 = 0x44;
const CMD_EXECUTE: u8 = 0x55;

impl CommandKind {
    /// Parse a command code from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CMD_FILL_RECT => Some(CommandKind::FillRect),
            CMD_DRAW_BITMAP => Some(CommandKind::DrawBitmap),
            CMD_BLIT_BUFFER => Some(CommandKind::BlitBuffer),
            CMD_SCROLL_BUFFER => Some(CommandKind::ScrollBuffer),
            CMD_EXECUTE => Some(CommandKind::ExecuteOpaque),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            CommandKind::FillRect => CMD_FILL_RECT,
            CommandKind::DrawBitmap => CMD_DRAW_BITMAP,
            CommandKind::BlitBuffer => CMD_BLIT_BUFFER,
            CommandKind::ScrollBuffer => CMD_SCROLL_BUFFER,
            CommandKind::ExecuteOpaque => CMD_EXECUTE,
        }
    }
}

/// A complete, checksum-valid frame
///
/// The raw bytes are kept as received so a frame can be re-sent or
/// compared byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: CommandKind,
    bytes: Vec<u8, MAX_FRAME_SIZE>,
}

fn xor_all(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, &b| acc ^ b)
}

impl Frame {
    /// Build a frame around a payload, filling in length and checksum
    pub fn new(command: CommandKind, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }
        let total = (MIN_FRAME_SIZE + payload.len()) as u16;

        let mut bytes = Vec::new();
        let [len_lo, len_hi] = total.to_le_bytes();
        bytes
            .extend_from_slice(&[PREAMBLE, PREAMBLE, PREAMBLE, command.to_byte(), len_lo, len_hi])
            .map_err(|_| FrameError::PayloadTooLarge)?;
        bytes
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        let checksum = xor_all(&bytes);
        bytes.push(checksum).map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self { command, bytes })
    }

    pub fn command(&self) -> CommandKind {
        self.command
    }

    /// Command-specific bytes between the header and the checksum
    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..self.bytes.len() - 1]
    }

    /// Total frame length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; a frame carries at least its header
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Trailing checksum byte
    pub fn checksum(&self) -> u8 {
        self.bytes[self.bytes.len() - 1]
    }

    /// The frame exactly as it appears on the wire
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Copy the wire bytes into `buffer`
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let len = self.bytes.len();
        if buffer.len() < len {
            return Err(FrameError::BufferTooSmall);
        }
        buffer[..len].copy_from_slice(&self.bytes);
        Ok(len)
    }
}

/// Counters describing what the decoder has seen
///
/// Purely informational; the link has no channel to report these back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoderStats {
    /// Checksum-valid frames handed out
    pub frames: u32,
    /// Frames received in full whose checksum was not zero
    pub checksum_errors: u32,
    /// Preamble or command mismatches after sync had started
    pub sync_losses: u32,
    /// Declared lengths outside the accepted range
    pub length_errors: u32,
    /// Out-of-band resets from the byte source
    pub link_resets: u32,
    /// Bytes dropped while hunting for the first preamble byte
    pub discarded_bytes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Matched this many preamble bytes so far (0..=2)
    Preamble(u8),
    /// Full preamble seen, waiting for the command code
    Command,
    /// Header accepted, collecting up to the declared length
    Collecting,
}

/// Incremental frame decoder
///
/// Consumes one byte at a time and hands out a [`Frame`] when the declared
/// length has been received and the checksum is zero. Any unexpected byte
/// drops all progress and starts hunting for a preamble again.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: DecodeState,
    buffer: Vec<u8, MAX_FRAME_SIZE>,
    checksum: u8,
    declared_len: Option<u16>,
    max_frame_len: u16,
    stats: DecoderStats,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a decoder accepting frames up to [`MAX_FRAME_SIZE`]
    pub const fn new() -> Self {
        Self {
            state: DecodeState::Preamble(0),
            buffer: Vec::new(),
            checksum: 0,
            declared_len: None,
            max_frame_len: MAX_FRAME_SIZE as u16,
            stats: DecoderStats {
                frames: 0,
                checksum_errors: 0,
                sync_losses: 0,
                length_errors: 0,
                link_resets: 0,
                discarded_bytes: 0,
            },
        }
    }

    /// Create a decoder with a tighter frame size limit
    ///
    /// The limit is clamped to `MIN_FRAME_SIZE..=MAX_FRAME_SIZE`.
    pub fn with_max_frame_len(max_frame_len: u16) -> Self {
        let mut decoder = Self::new();
        decoder.max_frame_len = max_frame_len.clamp(MIN_FRAME_SIZE as u16, MAX_FRAME_SIZE as u16);
        decoder
    }

    /// Out-of-band link reset: drop everything regardless of progress
    pub fn reset(&mut self) {
        self.stats.link_resets = self.stats.link_resets.wrapping_add(1);
        self.resync();
    }

    fn resync(&mut self) {
        self.state = DecodeState::Preamble(0);
        self.buffer.clear();
        self.checksum = 0;
        self.declared_len = None;
    }

    /// Sync progress: 0-2 preamble bytes matched, 3 awaiting command,
    /// 4 collecting the rest of the frame
    pub fn stage(&self) -> u8 {
        match self.state {
            DecodeState::Preamble(n) => n,
            DecodeState::Command => PREAMBLE_LEN as u8,
            DecodeState::Collecting => PREAMBLE_LEN as u8 + 1,
        }
    }

    /// Number of bytes buffered for the frame in progress
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Declared total length of the frame in progress, once known
    pub fn declared_len(&self) -> Option<u16> {
        self.declared_len
    }

    /// Largest frame this decoder accepts
    pub fn max_frame_len(&self) -> u16 {
        self.max_frame_len
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    fn accept(&mut self, byte: u8) -> bool {
        if self.buffer.push(byte).is_err() {
            return false;
        }
        self.checksum ^= byte;
        true
    }

    /// Feed a single byte to the decoder
    ///
    /// Returns `Some(frame)` on the byte that completes a valid frame.
    pub fn feed(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            DecodeState::Preamble(matched) => {
                if byte != PREAMBLE {
                    if matched == 0 {
                        self.stats.discarded_bytes = self.stats.discarded_bytes.wrapping_add(1);
                    } else {
                        self.stats.sync_losses = self.stats.sync_losses.wrapping_add(1);
                    }
                    self.resync();
                    return None;
                }
                self.accept(byte);
                self.state = if matched as usize + 1 == PREAMBLE_LEN {
                    DecodeState::Command
                } else {
                    DecodeState::Preamble(matched + 1)
                };
                None
            }
            DecodeState::Command => {
                if CommandKind::from_byte(byte).is_none() {
                    self.stats.sync_losses = self.stats.sync_losses.wrapping_add(1);
                    self.resync();
                    return None;
                }
                self.accept(byte);
                self.state = DecodeState::Collecting;
                None
            }
            DecodeState::Collecting => self.collect(byte),
        }
    }

    fn collect(&mut self, byte: u8) -> Option<Frame> {
        if !self.accept(byte) {
            self.length_error();
            return None;
        }

        if self.buffer.len() == HEADER_LEN {
            let declared = u16::from_le_bytes([self.buffer[4], self.buffer[5]]);
            if declared > self.max_frame_len || (declared as usize) < MIN_FRAME_SIZE {
                self.length_error();
                return None;
            }
            self.declared_len = Some(declared);
        }

        match self.declared_len {
            Some(len) if self.buffer.len() == len as usize => self.finish(),
            _ => None,
        }
    }

    fn length_error(&mut self) {
        self.stats.length_errors = self.stats.length_errors.wrapping_add(1);
        self.resync();
    }

    fn finish(&mut self) -> Option<Frame> {
        if self.checksum != 0 {
            self.stats.checksum_errors = self.stats.checksum_errors.wrapping_add(1);
            self.resync();
            return None;
        }

        let frame = CommandKind::from_byte(self.buffer[PREAMBLE_LEN]).map(|command| Frame {
            command,
            bytes: core::mem::replace(&mut self.buffer, Vec::new()),
        });
        if frame.is_some() {
            self.stats.frames = self.stats.frames.wrapping_add(1);
        }
        self.resync();
        frame
    }

    /// Feed multiple bytes to the decoder
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Option<Frame> {
        bytes.iter().find_map(|&byte| self.feed(byte))
    }
}
