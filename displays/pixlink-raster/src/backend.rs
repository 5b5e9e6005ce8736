//! Display flush trait
//!
//! Defines the interface a physical panel (or any other consumer of the
//! composited image) implements to receive changed regions.

use crate::rect::Rect;
use crate::surface::FrameView;

/// Flush errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushError {
    /// Communication error with the panel
    Communication,
    /// Panel not ready to accept pixels
    NotReady,
}

/// Sink for composited pixels
///
/// Called with the full surface view and the region that changed since the
/// previous successful flush. Implementations may push more than `dirty`
/// but must not assume anything outside it is up to date on their side.
pub trait DisplayFlush {
    /// Push `dirty` (inclusive, already clipped to the view) to the panel
    fn flush(&mut self, view: FrameView<'_>, dirty: Rect) -> Result<(), FlushError>;
}

impl<F: DisplayFlush + ?Sized> DisplayFlush for &mut F {
    fn flush(&mut self, view: FrameView<'_>, dirty: Rect) -> Result<(), FlushError> {
        (**self).flush(view, dirty)
    }
}
