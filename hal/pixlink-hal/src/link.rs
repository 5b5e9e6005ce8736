//! Link byte source abstraction
//!
//! Provides the trait a link receiver implements to hand bytes and reset
//! pulses to the decoder.

use core::convert::Infallible;

use pixlink_protocol::LinkEvent;

/// Source of link events
///
/// Implementations must deliver events in strict arrival order, without
/// duplicating or reordering them. There is no backpressure: a receiver
/// that falls behind loses bytes, and the decoder recovers by resyncing.
pub trait LinkSource {
    /// Error type for receive operations
    type Error;

    /// Take the next event
    ///
    /// Returns `Ok(None)` when no event is pending (or the source is
    /// exhausted).
    fn poll_event(&mut self) -> Result<Option<LinkEvent>, Self::Error>;

    /// Fill `buf` with pending events
    ///
    /// Stops early when the source goes idle. Returns the number of events
    /// written.
    fn poll_events(&mut self, buf: &mut [LinkEvent]) -> Result<usize, Self::Error> {
        let mut n = 0;
        while n < buf.len() {
            match self.poll_event()? {
                Some(event) => {
                    buf[n] = event;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl<S: LinkSource + ?Sized> LinkSource for &mut S {
    type Error = S::Error;

    fn poll_event(&mut self) -> Result<Option<LinkEvent>, Self::Error> {
        (**self).poll_event()
    }
}

/// Adapter exposing any event iterator as an infallible source
#[derive(Debug, Clone)]
pub struct IterSource<I> {
    events: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = LinkEvent>,
{
    pub fn new<T>(events: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            events: events.into_iter(),
        }
    }

    /// Consume the adapter and return the remaining events
    pub fn into_inner(self) -> I {
        self.events
    }
}

impl<I> LinkSource for IterSource<I>
where
    I: Iterator<Item = LinkEvent>,
{
    type Error = Infallible;

    fn poll_event(&mut self) -> Result<Option<LinkEvent>, Self::Error> {
        Ok(self.events.next())
    }
}
