//! Inclusive pixel rectangles and clipping

/// Axis-aligned rectangle with inclusive corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Rect {
    /// Create a rectangle from already-ordered corners
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create a rectangle from two corners given in any order
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::new(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
    }

    /// A single pixel
    pub const fn point(x: i32, y: i32) -> Self {
        Self::new(x, y, x, y)
    }

    /// The full extent of a `width` x `height` surface
    ///
    /// Returns `None` for a zero-sized surface.
    pub fn bounds(width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self::new(0, 0, width as i32 - 1, height as i32 - 1))
    }

    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x) as u32 + 1
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y) as u32 + 1
    }

    /// Number of pixels covered
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.contains(other.min_x, other.min_y) && self.contains(other.max_x, other.max_y)
    }

    /// Intersect with a `width` x `height` surface
    ///
    /// Returns `None` when nothing of the rectangle lands on the surface.
    /// Otherwise each axis is clamped to `[0, dimension - 1]`.
    pub fn clip(&self, width: u16, height: u16) -> Option<Rect> {
        let bounds = Self::bounds(width, height)?;
        if self.max_x < 0 || self.max_y < 0 || self.min_x > bounds.max_x || self.min_y > bounds.max_y
        {
            return None;
        }
        Some(Self::new(
            self.min_x.max(0),
            self.min_y.max(0),
            self.max_x.min(bounds.max_x),
            self.max_y.min(bounds.max_y),
        ))
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes() {
        assert_eq!(Rect::from_corners(9, 7, 2, 3), Rect::new(2, 3, 9, 7));
        assert_eq!(Rect::from_corners(2, 7, 9, 3), Rect::new(2, 3, 9, 7));
    }

    #[test]
    fn test_dimensions() {
        let r = Rect::new(-2, 0, 2, 9);
        assert_eq!(r.width(), 5);
        assert_eq!(r.height(), 10);
        assert_eq!(r.area(), 50);
        assert_eq!(Rect::point(4, 4).area(), 1);
    }

    #[test]
    fn test_clip_partial() {
        let r = Rect::new(-10, 5, 20, 500);
        assert_eq!(r.clip(100, 50), Some(Rect::new(0, 5, 20, 49)));
    }

    #[test]
    fn test_clip_fully_outside() {
        assert_eq!(Rect::new(-20, 0, -1, 10).clip(100, 50), None);
        assert_eq!(Rect::new(100, 0, 120, 10).clip(100, 50), None);
        assert_eq!(Rect::new(0, -5, 10, -1).clip(100, 50), None);
        assert_eq!(Rect::new(0, 50, 10, 60).clip(100, 50), None);
        assert_eq!(Rect::new(0, 0, 1, 1).clip(0, 50), None);
    }

    #[test]
    fn test_clip_inside_is_identity() {
        let r = Rect::new(3, 4, 5, 6);
        assert_eq!(r.clip(10, 10), Some(r));
    }

    #[test]
    fn test_union_and_contains() {
        let a = Rect::new(0, 0, 3, 3);
        let b = Rect::new(5, -1, 6, 2);
        let u = a.union(&b);

        assert_eq!(u, Rect::new(0, -1, 6, 3));
        assert!(u.contains_rect(&a));
        assert!(u.contains_rect(&b));
        assert!(!a.contains(4, 0));
    }
}
