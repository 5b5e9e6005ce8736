//! Capture file replay
//!
//! A capture is a raw dump of the bytes seen on the link data lines. The
//! reset line is not recorded, so every capture starts with a reset pulse.

use std::fs::File;
use std::io::{self, BufReader, Bytes, Read};
use std::path::Path;

use pixlink_hal::LinkSource;
use pixlink_protocol::LinkEvent;

/// Link source replaying one capture
pub struct CaptureSource<R> {
    bytes: Bytes<BufReader<R>>,
    reset_pending: bool,
    delivered: u64,
}

impl CaptureSource<File> {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> CaptureSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            bytes: BufReader::new(reader).bytes(),
            reset_pending: true,
            delivered: 0,
        }
    }

    /// Bytes handed out so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl<R: Read> LinkSource for CaptureSource<R> {
    type Error = io::Error;

    fn poll_event(&mut self) -> Result<Option<LinkEvent>, Self::Error> {
        if self.reset_pending {
            self.reset_pending = false;
            return Ok(Some(LinkEvent::Reset));
        }
        match self.bytes.next().transpose()? {
            Some(byte) => {
                self.delivered += 1;
                Ok(Some(LinkEvent::Byte(byte)))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_precedes_bytes() {
        let mut source = CaptureSource::new(&[0xAA, 0x11][..]);

        assert_eq!(source.poll_event().unwrap(), Some(LinkEvent::Reset));
        assert_eq!(source.poll_event().unwrap(), Some(LinkEvent::Byte(0xAA)));
        assert_eq!(source.poll_event().unwrap(), Some(LinkEvent::Byte(0x11)));
        assert_eq!(source.poll_event().unwrap(), None);
        assert_eq!(source.delivered(), 2);
    }

    #[test]
    fn test_empty_capture_still_resets() {
        let mut source = CaptureSource::new(io::empty());
        assert_eq!(source.poll_event().unwrap(), Some(LinkEvent::Reset));
        assert_eq!(source.poll_event().unwrap(), None);
    }

    #[test]
    fn test_read_errors_propagate() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("line dropped"))
            }
        }

        let mut source = CaptureSource::new(Failing);
        source.poll_event().unwrap();
        assert!(source.poll_event().is_err());
    }
}
