//! Link configuration
//!
//! Describes the panel geometry and pipeline policy. With the `serde`
//! feature the configuration can be read from text formats by the host and
//! stored in flash as postcard-serialized binary data.

use pixlink_protocol::{Rgb, MAX_FRAME_SIZE, MIN_FRAME_SIZE};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Width or height is zero
    ZeroDimension,
    /// `max_frame_len` outside `[MIN_FRAME_SIZE, MAX_FRAME_SIZE]`
    FrameLimitOutOfRange,
    /// Binary encoding failed (buffer too small)
    Serialize,
    /// Binary data is not a valid configuration
    Deserialize,
}

/// When composited pixels are pushed to the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FlushPolicy {
    /// Flush after every frame that changed pixels
    #[default]
    EveryFrame,
    /// Only flush when the embedding calls `flush()`
    Manual,
}

/// Link configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// Surface width in pixels
    pub width: u16,
    /// Surface height in pixels
    pub height: u16,
    /// Background colour as 0xRRGGBB
    pub background: u32,
    /// Largest frame the decoder accepts (bytes, header and checksum included)
    pub max_frame_len: u16,
    /// Flush policy
    pub flush: FlushPolicy,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            background: 0x000000,
            max_frame_len: MAX_FRAME_SIZE as u16,
            flush: FlushPolicy::EveryFrame,
        }
    }
}

impl LinkConfig {
    /// Check the configuration can drive a pipeline
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        let max = self.max_frame_len as usize;
        if !(MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&max) {
            return Err(ConfigError::FrameLimitOutOfRange);
        }
        Ok(())
    }

    /// Background as a colour
    pub fn background_color(&self) -> Rgb {
        Rgb::from_u32(self.background)
    }

    /// Serialize into `buffer`, returning the used prefix
    #[cfg(feature = "serde")]
    pub fn to_bytes<'b>(&self, buffer: &'b mut [u8]) -> Result<&'b mut [u8], ConfigError> {
        postcard::to_slice(self, buffer).map_err(|_| ConfigError::Serialize)
    }

    /// Deserialize and validate a stored configuration
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        config.validate()?;
        Ok(config)
    }
}
