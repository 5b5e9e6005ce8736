//! Typed drawing commands
//!
//! A validated [`Frame`] is turned into a [`DisplayCommand`] by reading its
//! payload through a [`PayloadReader`], so a short or malformed payload is
//! rejected before anything is drawn. Trailing bytes past the layout are
//! ignored.

use crate::color::{Background, Rgb};
use crate::frame::{CommandKind, Frame, FrameError, MAX_PAYLOAD_SIZE};
use crate::reader::PayloadReader;
use heapless::Vec;

/// Packed RGB bytes per pixel in blit payloads
pub const BLIT_BYTES_PER_PIXEL: usize = 3;

/// 1-bit-per-pixel bitmap as sent by the host
///
/// Bits are addressed from the end of the bitmap: the pixel at
/// `(row, col)` lives at index `width*height - (row*width + col) - 1`,
/// in byte `index / 8`, bit `index % 8`. Senders rely on this layout, so
/// it stays as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonoBitmap<'a> {
    pub width: u16,
    pub height: u16,
    pub bits: &'a [u8],
}

impl<'a> MonoBitmap<'a> {
    /// Bytes needed to hold `width * height` bits
    pub const fn byte_len(width: u16, height: u16) -> usize {
        (width as usize * height as usize).div_ceil(8)
    }

    /// Wrap bitmap bits, checking there are enough of them
    pub fn new(width: u16, height: u16, bits: &'a [u8]) -> Result<Self, FrameError> {
        let needed = Self::byte_len(width, height);
        if bits.len() < needed {
            return Err(FrameError::Truncated);
        }
        Ok(Self {
            width,
            height,
            bits: &bits[..needed],
        })
    }

    /// Whether the pixel at `(row, col)` is set
    ///
    /// Out-of-range coordinates read as clear.
    pub fn bit(&self, row: u16, col: u16) -> bool {
        if row >= self.height || col >= self.width {
            return false;
        }
        let (w, h) = (self.width as usize, self.height as usize);
        let index = h * w - (row as usize * w + col as usize) - 1;
        self.bits
            .get(index / 8)
            .is_some_and(|byte| byte & (1 << (index % 8)) != 0)
    }
}

/// Drawing commands carried by the link
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayCommand<'a> {
    /// Fill a rectangle with a solid colour
    FillRect {
        x1: i16,
        y1: i16,
        x2: i16,
        y2: i16,
        color: Rgb,
    },
    /// Draw a monochrome bitmap scaled up by an integer factor
    DrawBitmap {
        x: i16,
        y: i16,
        scale: u8,
        fg: Rgb,
        bg: Background,
        bitmap: MonoBitmap<'a>,
    },
    /// Copy packed RGB pixels into a rectangle
    BlitBuffer {
        x1: i16,
        y1: i16,
        x2: i16,
        y2: i16,
        pixels: &'a [u8],
    },
    /// Shift the whole surface vertically
    Scroll { lines: i16 },
    /// Opaque payload with no drawing effect
    Execute { data: &'a [u8] },
}

/// Blit pixel bytes for the rectangle spanned by two corners, in either order
///
/// `None` when the size does not fit in `usize`; no frame can carry that
/// many bytes.
fn span_bytes(x1: i16, y1: i16, x2: i16, y2: i16) -> Option<usize> {
    let w = u64::from((i32::from(x2) - i32::from(x1)).unsigned_abs()) + 1;
    let h = u64::from((i32::from(y2) - i32::from(y1)).unsigned_abs()) + 1;
    usize::try_from(w * h * BLIT_BYTES_PER_PIXEL as u64).ok()
}

fn push_all<const N: usize>(payload: &mut Vec<u8, N>, bytes: &[u8]) -> Result<(), FrameError> {
    payload
        .extend_from_slice(bytes)
        .map_err(|_| FrameError::PayloadTooLarge)
}

impl<'a> DisplayCommand<'a> {
    /// Parse a command from a validated frame
    pub fn from_frame(frame: &'a Frame) -> Result<Self, FrameError> {
        let mut r = PayloadReader::new(frame.payload());
        match frame.command() {
            CommandKind::FillRect => Ok(DisplayCommand::FillRect {
                x1: r.i16_le()?,
                y1: r.i16_le()?,
                x2: r.i16_le()?,
                y2: r.i16_le()?,
                color: r.rgb()?,
            }),
            CommandKind::DrawBitmap => {
                let x = r.i16_le()?;
                let y = r.i16_le()?;
                let width = r.u16_le()?;
                let height = r.u16_le()?;
                let scale = r.u8()?;
                let fg = r.rgb()?;
                let bg = Background::from_wire(r.i32_le()?);
                let bits = r.take(MonoBitmap::byte_len(width, height))?;
                Ok(DisplayCommand::DrawBitmap {
                    x,
                    y,
                    scale,
                    fg,
                    bg,
                    bitmap: MonoBitmap::new(width, height, bits)?,
                })
            }
            CommandKind::BlitBuffer => {
                let (x1, y1, x2, y2) = (r.i16_le()?, r.i16_le()?, r.i16_le()?, r.i16_le()?);
                let len = span_bytes(x1, y1, x2, y2).ok_or(FrameError::Truncated)?;
                let pixels = r.take(len)?;
                Ok(DisplayCommand::BlitBuffer {
                    x1,
                    y1,
                    x2,
                    y2,
                    pixels,
                })
            }
            CommandKind::ScrollBuffer => Ok(DisplayCommand::Scroll { lines: r.i16_le()? }),
            CommandKind::ExecuteOpaque => Ok(DisplayCommand::Execute { data: r.rest() }),
        }
    }

    /// Which command code this message is sent with
    pub fn kind(&self) -> CommandKind {
        match self {
            DisplayCommand::FillRect { .. } => CommandKind::FillRect,
            DisplayCommand::DrawBitmap { .. } => CommandKind::DrawBitmap,
            DisplayCommand::BlitBuffer { .. } => CommandKind::BlitBuffer,
            DisplayCommand::Scroll { .. } => CommandKind::ScrollBuffer,
            DisplayCommand::Execute { .. } => CommandKind::ExecuteOpaque,
        }
    }

    /// Encode this command into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
        match self {
            DisplayCommand::FillRect {
                x1,
                y1,
                x2,
                y2,
                color,
            } => {
                for v in [x1, y1, x2, y2] {
                    push_all(&mut payload, &v.to_le_bytes())?;
                }
                push_all(&mut payload, &color.to_wire())?;
            }
            DisplayCommand::DrawBitmap {
                x,
                y,
                scale,
                fg,
                bg,
                bitmap,
            } => {
                push_all(&mut payload, &x.to_le_bytes())?;
                push_all(&mut payload, &y.to_le_bytes())?;
                push_all(&mut payload, &bitmap.width.to_le_bytes())?;
                push_all(&mut payload, &bitmap.height.to_le_bytes())?;
                push_all(&mut payload, &[*scale])?;
                push_all(&mut payload, &fg.to_wire())?;
                push_all(&mut payload, &bg.to_wire().to_le_bytes())?;
                push_all(&mut payload, bitmap.bits)?;
            }
            DisplayCommand::BlitBuffer {
                x1,
                y1,
                x2,
                y2,
                pixels,
            } => {
                for v in [x1, y1, x2, y2] {
                    push_all(&mut payload, &v.to_le_bytes())?;
                }
                push_all(&mut payload, pixels)?;
            }
            DisplayCommand::Scroll { lines } => push_all(&mut payload, &lines.to_le_bytes())?,
            DisplayCommand::Execute { data } => push_all(&mut payload, data)?,
        }
        Frame::new(self.kind(), &payload)
    }
}
