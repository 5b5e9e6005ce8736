//! Events delivered by the link's byte source

/// One event from the parallel link, in arrival order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// A data byte latched on a strobe edge
    Byte(u8),
    /// The sender pulsed the reset line
    Reset,
}

impl LinkEvent {
    /// Returns the data byte, if this is a byte event
    pub fn byte(self) -> Option<u8> {
        match self {
            LinkEvent::Byte(b) => Some(b),
            LinkEvent::Reset => None,
        }
    }

    /// Returns true if this is a link reset
    pub fn is_reset(self) -> bool {
        matches!(self, LinkEvent::Reset)
    }
}

impl From<u8> for LinkEvent {
    fn from(byte: u8) -> Self {
        LinkEvent::Byte(byte)
    }
}
