//! Framebuffer-backed pixel surface
//!
//! Pixels are stored row-major, 4 bytes each: R, G, B and an alpha byte
//! that is always written fully opaque and never blended. The storage is
//! generic so the surface can sit directly on a memory-mapped framebuffer
//! slice or own a heap buffer.

use pixlink_protocol::Rgb;

use crate::rect::Rect;

/// Bytes per stored pixel (R, G, B, A)
pub const BYTES_PER_PIXEL: usize = 4;

/// Alpha value written with every pixel
pub const OPAQUE: u8 = 0xFF;

/// Surface construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SurfaceError {
    /// Width or height is zero
    ZeroSize,
    /// Storage cannot hold `width * height` pixels
    BufferTooSmall,
}

/// Addressable pixel buffer with a dirty rectangle
///
/// The dirty rectangle grows to cover every pixel written since the last
/// [`take_dirty`](Self::take_dirty) and is only emptied by that call.
#[derive(Debug, Clone)]
pub struct PixelSurface<B> {
    width: u16,
    height: u16,
    pixels: B,
    dirty: Option<Rect>,
}

impl<B> PixelSurface<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Wrap `pixels` as a `width` x `height` surface
    ///
    /// Storage beyond `width * height * 4` bytes is left untouched.
    pub fn new(width: u16, height: u16, pixels: B) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::ZeroSize);
        }
        if pixels.as_ref().len() < Self::required_len(width, height) {
            return Err(SurfaceError::BufferTooSmall);
        }
        Ok(Self {
            width,
            height,
            pixels,
            dirty: None,
        })
    }

    /// Storage size needed for a surface of this size
    pub const fn required_len(width: u16, height: u16) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// The whole surface as a rectangle
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32 - 1, self.height as i32 - 1)
    }

    fn row_bytes(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        y * self.row_bytes() + x * BYTES_PER_PIXEL
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    /// Read one pixel; `None` off-surface
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let at = self.offset(x as usize, y as usize);
        let px = &self.pixels.as_ref()[at..at + BYTES_PER_PIXEL];
        Some(Rgb::new(px[0], px[1], px[2]))
    }

    /// Write one pixel and mark it dirty
    ///
    /// Returns false (and writes nothing) off-surface.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Rgb) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        self.write(x as usize, y as usize, color);
        self.mark_dirty(Rect::point(x, y));
        true
    }

    /// Write one in-bounds pixel without touching the dirty rectangle
    pub(crate) fn write(&mut self, x: usize, y: usize, color: Rgb) {
        let at = self.offset(x, y);
        self.pixels.as_mut()[at..at + BYTES_PER_PIXEL]
            .copy_from_slice(&[color.r, color.g, color.b, OPAQUE]);
    }

    /// Fill columns `x0..=x1` of row `y`, all in bounds, without marking dirty
    pub(crate) fn fill_span(&mut self, y: usize, x0: usize, x1: usize, color: Rgb) {
        let start = self.offset(x0, y);
        let end = self.offset(x1, y) + BYTES_PER_PIXEL;
        let px = [color.r, color.g, color.b, OPAQUE];
        for chunk in self.pixels.as_mut()[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
            chunk.copy_from_slice(&px);
        }
    }

    /// Fill whole rows `y0..y1` without marking dirty
    pub(crate) fn fill_rows(&mut self, y0: usize, y1: usize, color: Rgb) {
        let last = self.width as usize - 1;
        for y in y0..y1 {
            self.fill_span(y, 0, last, color);
        }
    }

    /// Block-copy `count` rows from `src` to `dst` (overlap allowed)
    pub(crate) fn copy_rows(&mut self, src: usize, dst: usize, count: usize) {
        let row = self.row_bytes();
        self.pixels
            .as_mut()
            .copy_within(src * row..(src + count) * row, dst * row);
    }

    /// Clear the whole surface to `color`
    pub fn fill(&mut self, color: Rgb) {
        self.fill_rows(0, self.height as usize, color);
        self.mark_dirty(self.bounds());
    }

    /// Grow the dirty rectangle to cover `rect` (clipped to the surface)
    pub fn mark_dirty(&mut self, rect: Rect) {
        let Some(rect) = rect.clip(self.width, self.height) else {
            return;
        };
        self.dirty = Some(match self.dirty {
            Some(dirty) => dirty.union(&rect),
            None => rect,
        });
    }

    /// Region changed since the last flush
    pub fn dirty(&self) -> Option<Rect> {
        self.dirty
    }

    /// Hand the dirty region to a flush and start accumulating afresh
    pub fn take_dirty(&mut self) -> Option<Rect> {
        self.dirty.take()
    }

    /// Read-only view for flushing
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            pixels: &self.pixels.as_ref()[..Self::required_len(self.width, self.height)],
            width: self.width,
            height: self.height,
        }
    }

    /// Release the storage
    pub fn into_inner(self) -> B {
        self.pixels
    }
}

/// Borrowed, read-only view of a surface's pixels
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pixels: &'a [u8],
    width: u16,
    height: u16,
}

impl<'a> FrameView<'a> {
    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Raw R, G, B, A bytes, row-major
    pub fn as_bytes(&self) -> &'a [u8] {
        self.pixels
    }

    /// One row of raw pixel bytes
    pub fn row(&self, y: u16) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let len = self.width as usize * BYTES_PER_PIXEL;
        let start = y as usize * len;
        Some(&self.pixels[start..start + len])
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb> {
        if x >= self.width {
            return None;
        }
        let at = x as usize * BYTES_PER_PIXEL;
        self.row(y).map(|row| Rgb::new(row[at], row[at + 1], row[at + 2]))
    }
}
