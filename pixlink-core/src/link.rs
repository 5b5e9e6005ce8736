//! Display link pipeline
//!
//! Ties the frame decoder, the compositor and a flush sink together. Every
//! link event goes through [`DisplayLink::handle`]; completed frames are
//! decoded, applied to the surface and, depending on the flush policy,
//! pushed to the panel.

use core::convert::Infallible;

use pixlink_hal::LinkSource;
use pixlink_protocol::{CommandKind, DecoderStats, DisplayCommand, Frame, FrameDecoder, LinkEvent};
use pixlink_raster::{Compositor, DisplayFlush, FlushError, PixelSurface, SurfaceError};

use crate::config::{ConfigError, FlushPolicy, LinkConfig};

/// Pipeline errors
///
/// `E` is the error type of the link source driven by [`DisplayLink::pump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError<E = Infallible> {
    /// The flush sink rejected the dirty region
    Flush(FlushError),
    /// Surface storage does not fit the configured size
    Surface(SurfaceError),
    /// Invalid configuration
    Config(ConfigError),
    /// The link source failed
    Source(E),
}

impl LinkError<Infallible> {
    fn widen<E>(self) -> LinkError<E> {
        match self {
            LinkError::Flush(e) => LinkError::Flush(e),
            LinkError::Surface(e) => LinkError::Surface(e),
            LinkError::Config(e) => LinkError::Config(e),
            LinkError::Source(never) => match never {},
        }
    }
}

impl<E> From<FlushError> for LinkError<E> {
    fn from(e: FlushError) -> Self {
        LinkError::Flush(e)
    }
}

impl<E> From<SurfaceError> for LinkError<E> {
    fn from(e: SurfaceError) -> Self {
        LinkError::Surface(e)
    }
}

impl<E> From<ConfigError> for LinkError<E> {
    fn from(e: ConfigError) -> Self {
        LinkError::Config(e)
    }
}

/// Pipeline counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Frames decoded into a command and applied
    pub frames_applied: u32,
    /// Valid frames whose payload did not decode
    pub payload_errors: u32,
    /// Successful flushes
    pub flushes: u32,
    /// Flushes the sink rejected
    pub flush_errors: u32,
}

/// Decode, composite and flush pipeline
pub struct DisplayLink<B, F> {
    decoder: FrameDecoder,
    compositor: Compositor<B>,
    sink: F,
    policy: FlushPolicy,
    stats: LinkStats,
}

impl<B, F> DisplayLink<B, F>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
    F: DisplayFlush,
{
    /// Build a pipeline drawing into `storage`
    ///
    /// The surface is cleared to the configured background. Nothing is
    /// flushed until the first frame arrives.
    pub fn new(config: &LinkConfig, storage: B, sink: F) -> Result<Self, LinkError> {
        config.validate()?;
        let surface = PixelSurface::new(config.width, config.height, storage)?;

        Ok(Self {
            decoder: FrameDecoder::with_max_frame_len(config.max_frame_len),
            compositor: Compositor::new(surface, config.background_color()),
            sink,
            policy: config.flush,
            stats: LinkStats::default(),
        })
    }

    /// Process one link event
    ///
    /// Returns the kind of command applied when the event completed a frame.
    pub fn handle(&mut self, event: LinkEvent) -> Result<Option<CommandKind>, LinkError> {
        match event {
            LinkEvent::Reset => {
                self.signal_reset();
                Ok(None)
            }
            LinkEvent::Byte(byte) => self.feed_byte(byte),
        }
    }

    /// Feed one received byte
    pub fn feed_byte(&mut self, byte: u8) -> Result<Option<CommandKind>, LinkError> {
        match self.decoder.feed(byte) {
            Some(frame) => self.on_frame(&frame),
            None => Ok(None),
        }
    }

    /// The reset line was asserted: drop any partial frame
    pub fn signal_reset(&mut self) {
        self.decoder.reset();
    }

    /// Apply a complete, checksum-valid frame
    ///
    /// Frames whose payload does not decode are counted and dropped.
    pub fn on_frame(&mut self, frame: &Frame) -> Result<Option<CommandKind>, LinkError> {
        let command = match DisplayCommand::from_frame(frame) {
            Ok(command) => command,
            Err(_) => {
                self.stats.payload_errors = self.stats.payload_errors.wrapping_add(1);
                return Ok(None);
            }
        };

        self.compositor.apply(&command);
        self.stats.frames_applied = self.stats.frames_applied.wrapping_add(1);

        if self.policy == FlushPolicy::EveryFrame {
            self.flush()?;
        }
        Ok(Some(command.kind()))
    }

    /// Push the accumulated dirty region to the sink
    ///
    /// Returns false when nothing was dirty. On failure the dirty region is
    /// kept so the next flush retries all of it.
    pub fn flush(&mut self) -> Result<bool, LinkError> {
        let surface = self.compositor.surface();
        let Some(dirty) = surface.dirty() else {
            return Ok(false);
        };

        match self.sink.flush(surface.view(), dirty) {
            Ok(()) => {
                self.compositor.surface_mut().take_dirty();
                self.stats.flushes = self.stats.flushes.wrapping_add(1);
                Ok(true)
            }
            Err(e) => {
                self.stats.flush_errors = self.stats.flush_errors.wrapping_add(1);
                Err(LinkError::Flush(e))
            }
        }
    }

    /// Drain `source` until it goes idle
    ///
    /// Returns the number of frames applied. A failed flush does not stop
    /// decoding: it is counted in [`LinkStats::flush_errors`] and the dirty
    /// region waits for the next flush.
    pub fn pump<S: LinkSource>(&mut self, source: &mut S) -> Result<usize, LinkError<S::Error>> {
        let mut applied = 0;
        while let Some(event) = source.poll_event().map_err(LinkError::Source)? {
            match self.handle(event) {
                Ok(Some(_)) | Err(LinkError::Flush(_)) => applied += 1,
                Ok(None) => {}
                Err(e) => return Err(e.widen()),
            }
        }
        Ok(applied)
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn decoder_stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    pub fn compositor(&self) -> &Compositor<B> {
        &self.compositor
    }

    pub fn compositor_mut(&mut self) -> &mut Compositor<B> {
        &mut self.compositor
    }

    pub fn sink(&self) -> &F {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut F {
        &mut self.sink
    }

    /// Tear down the pipeline, returning the compositor and the sink
    pub fn into_parts(self) -> (Compositor<B>, F) {
        (self.compositor, self.sink)
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use pixlink_hal::IterSource;
    use pixlink_protocol::{Background, MonoBitmap, Rgb};
    use pixlink_raster::{FrameView, Rect};

    /// Sink recording every flushed region, optionally failing
    #[derive(Default)]
    struct RecordingSink {
        regions: Vec<Rect>,
        fail: Option<FlushError>,
        failures_left: u32,
    }

    impl DisplayFlush for RecordingSink {
        fn flush(&mut self, view: FrameView<'_>, dirty: Rect) -> Result<(), FlushError> {
            assert!(dirty.max_x < view.width() as i32 && dirty.max_y < view.height() as i32);
            if let Some(e) = self.fail {
                return Err(e);
            }
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(FlushError::Communication);
            }
            self.regions.push(dirty);
            Ok(())
        }
    }

    fn config(flush: FlushPolicy) -> LinkConfig {
        LinkConfig {
            width: 32,
            height: 16,
            flush,
            ..LinkConfig::default()
        }
    }

    fn link(flush: FlushPolicy) -> DisplayLink<Vec<u8>, RecordingSink> {
        let storage = vec![0; PixelSurface::<Vec<u8>>::required_len(32, 16)];
        DisplayLink::new(&config(flush), storage, RecordingSink::default()).unwrap()
    }

    fn fill(x1: i16, y1: i16, x2: i16, y2: i16, color: Rgb) -> Frame {
        DisplayCommand::FillRect {
            x1,
            y1,
            x2,
            y2,
            color,
        }
        .to_frame()
        .unwrap()
    }

    fn feed_all<B, F>(link: &mut DisplayLink<B, F>, bytes: &[u8]) -> Vec<CommandKind>
    where
        B: AsRef<[u8]> + AsMut<[u8]>,
        F: DisplayFlush,
    {
        bytes
            .iter()
            .filter_map(|&b| link.feed_byte(b).unwrap())
            .collect()
    }

    #[test]
    fn test_new_rejects_bad_setup() {
        let bad = LinkConfig {
            width: 0,
            ..LinkConfig::default()
        };
        let err = DisplayLink::new(&bad, vec![0u8; 16], RecordingSink::default()).err();
        assert_eq!(err, Some(LinkError::Config(ConfigError::ZeroDimension)));

        let storage = vec![0u8; 16];
        let err = DisplayLink::new(&config(FlushPolicy::Manual), storage, RecordingSink::default()).err();
        assert_eq!(err, Some(LinkError::Surface(SurfaceError::BufferTooSmall)));
    }

    #[test]
    fn test_new_clears_to_background() {
        let config = LinkConfig {
            background: 0x102030,
            ..config(FlushPolicy::Manual)
        };
        let storage = vec![0; PixelSurface::<Vec<u8>>::required_len(32, 16)];
        let link = DisplayLink::new(&config, storage, RecordingSink::default()).unwrap();

        let surface = link.compositor().surface();
        assert_eq!(surface.pixel(0, 0), Some(Rgb::new(0x10, 0x20, 0x30)));
        assert_eq!(surface.pixel(31, 15), Some(Rgb::new(0x10, 0x20, 0x30)));
        assert_eq!(surface.dirty(), Some(Rect::new(0, 0, 31, 15)));
        assert_eq!(link.compositor().background(), Rgb::new(0x10, 0x20, 0x30));
        assert!(link.sink().regions.is_empty());
    }

    #[test]
    fn test_frame_applies_and_flushes() {
        let mut link = link(FlushPolicy::EveryFrame);
        link.compositor_mut().surface_mut().take_dirty();

        let frame = fill(-10, 2, 20, 4, Rgb::WHITE);
        assert_eq!(feed_all(&mut link, frame.as_bytes()), [CommandKind::FillRect]);

        assert_eq!(link.sink().regions, [Rect::new(0, 2, 20, 4)]);
        assert_eq!(link.compositor().surface().pixel(0, 3), Some(Rgb::WHITE));
        assert_eq!(link.compositor().surface().dirty(), None);
        assert_eq!(link.stats().frames_applied, 1);
        assert_eq!(link.stats().flushes, 1);
    }

    #[test]
    fn test_first_flush_covers_initial_clear() {
        let mut link = link(FlushPolicy::EveryFrame);
        let frame = fill(0, 0, 0, 0, Rgb::WHITE);
        feed_all(&mut link, frame.as_bytes());

        assert_eq!(link.sink().regions, [Rect::new(0, 0, 31, 15)]);
    }

    #[test]
    fn test_manual_policy_accumulates() {
        let mut link = link(FlushPolicy::Manual);
        link.compositor_mut().surface_mut().take_dirty();

        let mut bytes = Vec::new();
        bytes.extend_from_slice(fill(1, 1, 2, 2, Rgb::WHITE).as_bytes());
        bytes.extend_from_slice(fill(10, 5, 12, 6, Rgb::WHITE).as_bytes());
        assert_eq!(feed_all(&mut link, &bytes).len(), 2);
        assert!(link.sink().regions.is_empty());

        assert_eq!(link.flush(), Ok(true));
        assert_eq!(link.sink().regions, [Rect::new(1, 1, 12, 6)]);
        assert_eq!(link.flush(), Ok(false));
    }

    #[test]
    fn test_flush_failure_keeps_dirty() {
        let mut link = link(FlushPolicy::EveryFrame);
        link.compositor_mut().surface_mut().take_dirty();
        link.sink_mut().fail = Some(FlushError::NotReady);

        let frame = fill(0, 0, 3, 3, Rgb::WHITE);
        let result: Result<Vec<_>, _> = frame
            .as_bytes()
            .iter()
            .map(|&b| link.feed_byte(b))
            .collect();
        assert_eq!(result, Err(LinkError::Flush(FlushError::NotReady)));
        assert_eq!(link.compositor().surface().dirty(), Some(Rect::new(0, 0, 3, 3)));
        assert_eq!(link.stats().flush_errors, 1);

        link.sink_mut().fail = None;
        let frame = fill(8, 8, 9, 9, Rgb::WHITE);
        feed_all(&mut link, frame.as_bytes());
        assert_eq!(link.sink().regions, [Rect::new(0, 0, 9, 9)]);
    }

    #[test]
    fn test_payload_error_is_counted_and_dropped() {
        let mut link = link(FlushPolicy::EveryFrame);
        // Valid frame, payload two bytes short of a FillRect
        let frame = Frame::new(CommandKind::FillRect, &[0; 9]).unwrap();

        assert_eq!(link.on_frame(&frame), Ok(None));
        assert_eq!(link.stats().payload_errors, 1);
        assert_eq!(link.stats().frames_applied, 0);
        assert!(link.sink().regions.is_empty());
    }

    #[test]
    fn test_execute_opaque_leaves_surface() {
        let mut link = link(FlushPolicy::EveryFrame);
        link.compositor_mut().surface_mut().take_dirty();
        let frame = Frame::new(CommandKind::ExecuteOpaque, &[0xDE, 0xAD]).unwrap();

        assert_eq!(link.on_frame(&frame), Ok(Some(CommandKind::ExecuteOpaque)));
        assert!(link.sink().regions.is_empty());
    }

    #[test]
    fn test_reset_abandons_partial_frame() {
        let mut link = link(FlushPolicy::Manual);
        let frame = fill(0, 0, 1, 1, Rgb::WHITE);
        let bytes = frame.as_bytes();

        let mut events: Vec<LinkEvent> = bytes[..8].iter().copied().map(LinkEvent::Byte).collect();
        events.push(LinkEvent::Reset);
        events.extend(bytes.iter().copied().map(LinkEvent::Byte));

        let mut source = IterSource::new(events);
        assert_eq!(link.pump(&mut source), Ok(1));
        assert_eq!(link.decoder_stats().link_resets, 1);
        assert_eq!(link.decoder().stage(), 0);
    }

    #[test]
    fn test_pump_keeps_decoding_after_failed_flush() {
        let mut link = link(FlushPolicy::EveryFrame);
        link.compositor_mut().surface_mut().take_dirty();
        link.sink_mut().failures_left = 1;

        let mut events: Vec<LinkEvent> = Vec::new();
        for frame in [fill(0, 0, 1, 1, Rgb::WHITE), fill(5, 5, 6, 6, Rgb::WHITE)] {
            events.extend(frame.as_bytes().iter().copied().map(LinkEvent::Byte));
        }
        let mut source = IterSource::new(events);

        assert_eq!(link.pump(&mut source), Ok(2));
        assert_eq!(source.poll_event(), Ok(None));
        assert_eq!(link.compositor().surface().pixel(5, 5), Some(Rgb::WHITE));

        let stats = link.stats();
        assert_eq!(stats.frames_applied, 2);
        assert_eq!(stats.flush_errors, 1);
        assert_eq!(stats.flushes, 1);
        // The retry carries the region the failed flush left behind
        assert_eq!(link.sink().regions, [Rect::new(0, 0, 6, 6)]);
        assert_eq!(link.compositor().surface().dirty(), None);
    }

    #[test]
    fn test_pump_surfaces_source_errors() {
        struct Broken;
        impl LinkSource for Broken {
            type Error = u8;
            fn poll_event(&mut self) -> Result<Option<LinkEvent>, u8> {
                Err(7)
            }
        }

        let mut link = link(FlushPolicy::Manual);
        assert_eq!(link.pump(&mut Broken), Err(LinkError::Source(7)));
    }

    #[test]
    fn test_overlay_over_stream() {
        let mut link = link(FlushPolicy::Manual);
        let bits = [0u8; 2];
        let bitmap = MonoBitmap::new(4, 4, &bits).unwrap();
        let overlay = DisplayCommand::DrawBitmap {
            x: 2,
            y: 2,
            scale: 2,
            fg: Rgb::WHITE,
            bg: Background::Transparent,
            bitmap,
        }
        .to_frame()
        .unwrap();

        let mut bytes = Vec::new();
        bytes.extend_from_slice(fill(0, 0, 31, 15, Rgb::new(1, 2, 3)).as_bytes());
        bytes.extend_from_slice(overlay.as_bytes());
        feed_all(&mut link, &bytes);

        let surface = link.compositor().surface();
        for y in 0..16 {
            for x in 0..32 {
                assert_eq!(surface.pixel(x, y), Some(Rgb::new(1, 2, 3)));
            }
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn command<'a>(kind: u8, c: [i16; 4], color: u32, pixels: &'a [u8]) -> DisplayCommand<'a> {
            let [x1, y1, x2, y2] = c;
            match kind {
                0 => DisplayCommand::FillRect {
                    x1,
                    y1,
                    x2,
                    y2,
                    color: Rgb::from_u32(color),
                },
                1 => DisplayCommand::BlitBuffer {
                    x1,
                    y1,
                    x2: x1 + (x2 & 3),
                    y2: y1 + (y2 & 3),
                    pixels,
                },
                _ => DisplayCommand::Scroll { lines: x1 % 20 },
            }
        }

        proptest! {
            #[test]
            fn replayed_frame_repeats_compositor_call(
                kind in 0u8..3,
                c in proptest::array::uniform4(-40i16..70),
                color in any::<u32>(),
                seed in proptest::collection::vec(any::<u8>(), 48),
            ) {
                // 48 bytes covers the largest 4x4 blit
                let cmd = command(kind, c, color, &seed);
                let frame = cmd.to_frame().unwrap();

                let mut piped = link(FlushPolicy::EveryFrame);
                let mut bytes = Vec::new();
                bytes.extend_from_slice(frame.as_bytes());
                bytes.extend_from_slice(frame.as_bytes());
                let kinds = feed_all(&mut piped, &bytes);
                prop_assert_eq!(kinds, vec![cmd.kind(), cmd.kind()]);

                let mut direct = link(FlushPolicy::Manual);
                direct.compositor_mut().apply(&cmd);
                direct.compositor_mut().apply(&cmd);

                prop_assert_eq!(
                    piped.compositor().surface().view().as_bytes(),
                    direct.compositor().surface().view().as_bytes()
                );
                prop_assert_eq!(piped.stats().frames_applied, 2);
            }
        }
    }
}
