//! Raster compositor
//!
//! Executes decoded drawing commands against a [`PixelSurface`]. Every
//! operation clips to the surface instead of rejecting out-of-range
//! geometry, and grows the surface's dirty rectangle by exactly what it
//! wrote.

use alloc::vec;
use alloc::vec::Vec;

use pixlink_protocol::messages::BLIT_BYTES_PER_PIXEL;
use pixlink_protocol::{Background, DisplayCommand, MonoBitmap, Rgb};

use crate::rect::Rect;
use crate::surface::PixelSurface;

/// Drawing engine owning the surface it draws on
#[derive(Debug, Clone)]
pub struct Compositor<B> {
    surface: PixelSurface<B>,
    background: Rgb,
}

impl<B> Compositor<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Take ownership of `surface` and clear it to `background`
    pub fn new(mut surface: PixelSurface<B>, background: Rgb) -> Self {
        surface.fill(background);
        Self {
            surface,
            background,
        }
    }

    pub fn surface(&self) -> &PixelSurface<B> {
        &self.surface
    }

    /// Mutable access for the flush path (dirty bookkeeping)
    pub fn surface_mut(&mut self) -> &mut PixelSurface<B> {
        &mut self.surface
    }

    pub fn into_surface(self) -> PixelSurface<B> {
        self.surface
    }

    /// Colour used for bands exposed by scrolling
    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn set_background(&mut self, color: Rgb) {
        self.background = color;
    }

    fn clip(&self, rect: Rect) -> Option<Rect> {
        rect.clip(self.surface.width(), self.surface.height())
    }

    /// Execute one decoded command
    ///
    /// Returns true if any pixel was written.
    pub fn apply(&mut self, command: &DisplayCommand<'_>) -> bool {
        match *command {
            DisplayCommand::FillRect {
                x1,
                y1,
                x2,
                y2,
                color,
            } => self.fill_rect(x1.into(), y1.into(), x2.into(), y2.into(), color),
            DisplayCommand::DrawBitmap {
                x,
                y,
                scale,
                fg,
                bg,
                ref bitmap,
            } => self.draw_bitmap(x.into(), y.into(), bitmap, scale, fg, bg),
            DisplayCommand::BlitBuffer {
                x1,
                y1,
                x2,
                y2,
                pixels,
            } => self.blit_buffer(x1.into(), y1.into(), x2.into(), y2.into(), pixels),
            DisplayCommand::Scroll { lines } => self.scroll(lines.into()),
            DisplayCommand::Execute { .. } => false,
        }
    }

    /// Fill the rectangle spanned by two corners with a solid colour
    pub fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb) -> bool {
        let Some(area) = self.clip(Rect::from_corners(x1, y1, x2, y2)) else {
            return false;
        };
        for y in area.min_y..=area.max_y {
            self.surface
                .fill_span(y as usize, area.min_x as usize, area.max_x as usize, color);
        }
        self.surface.mark_dirty(area);
        true
    }

    /// Copy packed R, G, B source pixels into a rectangle
    ///
    /// The source is laid out over the whole requested rectangle: its row
    /// stride is the unclipped width and columns are indexed from the
    /// unclipped left edge, so clipped-off pixels still occupy their 3
    /// bytes. Drawing stops where the source runs out.
    pub fn blit_buffer(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, src: &[u8]) -> bool {
        let target = Rect::from_corners(x1, y1, x2, y2);
        let Some(area) = self.clip(target) else {
            return false;
        };
        let stride = u64::from(target.width());

        let mut last_row = None;
        'rows: for y in area.min_y..=area.max_y {
            let row_start = (y - target.min_y) as u64 * stride;
            for x in area.min_x..=area.max_x {
                let at = (row_start + (x - target.min_x) as u64) * BLIT_BYTES_PER_PIXEL as u64;
                let Some(px) = usize::try_from(at)
                    .ok()
                    .and_then(|at| src.get(at..))
                    .and_then(|rest| rest.get(..BLIT_BYTES_PER_PIXEL))
                else {
                    break 'rows;
                };
                self.surface
                    .write(x as usize, y as usize, Rgb::new(px[0], px[1], px[2]));
                last_row = Some(y);
            }
        }

        match last_row {
            Some(max_y) => {
                self.surface
                    .mark_dirty(Rect::new(area.min_x, area.min_y, area.max_x, max_y));
                true
            }
            None => false,
        }
    }

    /// Read a rectangle back as packed R, G, B bytes
    ///
    /// Always returns `width * height * 3` bytes for the normalized
    /// rectangle; pixels off the surface read as zero.
    pub fn read_buffer(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> Vec<u8> {
        let target = Rect::from_corners(x1, y1, x2, y2);
        let stride = target.width() as usize;
        let mut out = vec![0u8; target.area() as usize * BLIT_BYTES_PER_PIXEL];

        if let Some(area) = self.clip(target) {
            for y in area.min_y..=area.max_y {
                let row_start = (y - target.min_y) as usize * stride;
                for x in area.min_x..=area.max_x {
                    let at = (row_start + (x - target.min_x) as usize) * BLIT_BYTES_PER_PIXEL;
                    if let Some(px) = self.surface.pixel(x, y) {
                        out[at..at + BLIT_BYTES_PER_PIXEL].copy_from_slice(&[px.r, px.g, px.b]);
                    }
                }
            }
        }
        out
    }

    /// Draw a monochrome bitmap magnified `scale` times
    ///
    /// Set bits are drawn in `fg`. Clear bits are drawn in the background
    /// colour, or with [`Background::Transparent`] keep the pixel that was
    /// on screen before the call, taken from a read-back of the destination
    /// made up front.
    ///
    /// Off-surface pixels are skipped one by one. Once a scaled row lands
    /// below the bottom edge the rest of the bitmap is abandoned.
    pub fn draw_bitmap(
        &mut self,
        x: i32,
        y: i32,
        bitmap: &MonoBitmap<'_>,
        scale: u8,
        fg: Rgb,
        bg: Background,
    ) -> bool {
        if scale == 0 || bitmap.width == 0 || bitmap.height == 0 {
            return false;
        }
        let scale = scale as i32;
        let footprint = Rect::new(
            x,
            y,
            x + bitmap.width as i32 * scale - 1,
            y + bitmap.height as i32 * scale - 1,
        );
        let Some(visible) = self.clip(footprint) else {
            return false;
        };

        let snapshot = match bg {
            Background::Transparent => Some(self.read_buffer(
                visible.min_x,
                visible.min_y,
                visible.max_x,
                visible.max_y,
            )),
            Background::Color(_) => None,
        };
        let snapshot_stride = visible.width() as usize;

        let width = self.surface.width() as i32;
        let height = self.surface.height() as i32;
        let mut touched: Option<Rect> = None;

        'rows: for row in 0..bitmap.height {
            for sy in 0..scale {
                let py = y + row as i32 * scale + sy;
                if py >= height {
                    break 'rows;
                }
                if py < 0 {
                    continue;
                }
                'cols: for col in 0..bitmap.width {
                    let set = bitmap.bit(row, col);
                    for sx in 0..scale {
                        let px = x + col as i32 * scale + sx;
                        if px >= width {
                            break 'cols;
                        }
                        if px < 0 {
                            continue;
                        }
                        let color = match (set, bg, &snapshot) {
                            (true, _, _) => fg,
                            (false, Background::Color(color), _) => color,
                            (false, Background::Transparent, Some(saved)) => {
                                let at = ((py - visible.min_y) as usize * snapshot_stride
                                    + (px - visible.min_x) as usize)
                                    * BLIT_BYTES_PER_PIXEL;
                                Rgb::new(saved[at], saved[at + 1], saved[at + 2])
                            }
                            (false, Background::Transparent, None) => continue,
                        };
                        self.surface.write(px as usize, py as usize, color);
                        let point = Rect::point(px, py);
                        touched = Some(touched.map_or(point, |t| t.union(&point)));
                    }
                }
            }
        }

        match touched {
            Some(rect) => {
                self.surface.mark_dirty(rect);
                true
            }
            None => false,
        }
    }

    /// Shift the surface content vertically
    ///
    /// Positive `lines` moves content up, negative moves it down. The band
    /// uncovered at the trailing edge is filled with the background colour.
    /// The whole surface is marked dirty.
    pub fn scroll(&mut self, lines: i32) -> bool {
        if lines == 0 {
            return false;
        }
        let height = self.surface.height() as usize;
        let shift = lines.unsigned_abs() as usize;
        let background = self.background;

        if shift >= height {
            self.surface.fill_rows(0, height, background);
        } else if lines > 0 {
            self.surface.copy_rows(shift, 0, height - shift);
            self.surface.fill_rows(height - shift, height, background);
        } else {
            self.surface.copy_rows(0, shift, height - shift);
            self.surface.fill_rows(0, shift, background);
        }

        let bounds = self.surface.bounds();
        self.surface.mark_dirty(bounds);
        true
    }
}
