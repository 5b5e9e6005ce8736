//! Shadow framebuffer sink
//!
//! Mirrors flushed regions into an RGB image standing in for panel memory.
//! Only the dirty rectangle is copied on each flush, so the image shows
//! exactly what a panel fed by the same flushes would show.

use std::path::Path;

use anyhow::{Context, Result};
use image::RgbImage;
use pixlink_raster::{DisplayFlush, FlushError, FrameView, Rect};
use tracing::{debug, info, trace};

pub struct ShadowFlush {
    image: RgbImage,
    flushes: u64,
    pixels: u64,
}

impl ShadowFlush {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            image: RgbImage::new(width.into(), height.into()),
            flushes: 0,
            pixels: 0,
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Total pixels copied across all flushes
    pub fn pixels_copied(&self) -> u64 {
        self.pixels
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.image
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            "Saved {}x{} shadow to {:?} after {} flushes",
            self.image.width(),
            self.image.height(),
            path,
            self.flushes
        );
        Ok(())
    }
}

impl DisplayFlush for ShadowFlush {
    fn flush(&mut self, view: FrameView<'_>, dirty: Rect) -> Result<(), FlushError> {
        if u32::from(view.width()) != self.image.width()
            || u32::from(view.height()) != self.image.height()
        {
            debug!("Shadow size does not match surface, rejecting flush");
            return Err(FlushError::NotReady);
        }

        for y in dirty.min_y..=dirty.max_y {
            for x in dirty.min_x..=dirty.max_x {
                let px = view
                    .pixel(x as u16, y as u16)
                    .ok_or(FlushError::Communication)?;
                self.image
                    .put_pixel(x as u32, y as u32, image::Rgb([px.r, px.g, px.b]));
            }
        }

        self.flushes += 1;
        self.pixels += dirty.area();
        trace!(?dirty, "Flushed region");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixlink_protocol::Rgb;
    use pixlink_raster::PixelSurface;

    fn surface(width: u16, height: u16) -> PixelSurface<Vec<u8>> {
        let storage = vec![0; PixelSurface::<Vec<u8>>::required_len(width, height)];
        PixelSurface::new(width, height, storage).unwrap()
    }

    #[test]
    fn test_only_dirty_region_is_copied() {
        let mut s = surface(4, 4);
        s.fill(Rgb::WHITE);
        let mut shadow = ShadowFlush::new(4, 4);

        shadow.flush(s.view(), Rect::new(1, 1, 2, 1)).unwrap();

        assert_eq!(shadow.image().get_pixel(1, 1), &image::Rgb([0xFF, 0xFF, 0xFF]));
        assert_eq!(shadow.image().get_pixel(2, 1), &image::Rgb([0xFF, 0xFF, 0xFF]));
        assert_eq!(shadow.image().get_pixel(0, 0), &image::Rgb([0, 0, 0]));
        assert_eq!(shadow.image().get_pixel(1, 2), &image::Rgb([0, 0, 0]));
        assert_eq!(shadow.pixels_copied(), 2);
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let s = surface(4, 4);
        let mut shadow = ShadowFlush::new(8, 4);
        assert_eq!(
            shadow.flush(s.view(), Rect::point(0, 0)),
            Err(FlushError::NotReady)
        );
    }

    #[test]
    fn test_save_png() {
        let mut s = surface(2, 2);
        s.put_pixel(1, 0, Rgb::new(10, 20, 30));
        let mut shadow = ShadowFlush::new(2, 2);
        shadow.flush(s.view(), s.bounds()).unwrap();

        let path = std::env::temp_dir().join(format!("pixlink-shadow-{}.png", std::process::id()));
        shadow.save(&path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgb8();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.get_pixel(1, 0), &image::Rgb([10, 20, 30]));
    }
}
