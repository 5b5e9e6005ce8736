//! Host configuration
//!
//! Loaded from a TOML file. Every key is optional:
//!
//! ```toml
//! output = "frame.png"
//!
//! [link]
//! width = 320
//! height = 240
//! background = 0x000000
//! max_frame_len = 2990
//! flush = "every_frame"   # or "manual"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use pixlink_core::LinkConfig;
use serde::Deserialize;
use tracing::{debug, info};

/// Default PNG written on exit
pub const DEFAULT_OUTPUT: &str = "pixlink.png";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Where the shadow framebuffer is saved
    pub output: PathBuf,
    /// Pipeline setup
    pub link: LinkConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            link: LinkConfig::default(),
        }
    }
}

impl HostConfig {
    /// Load from `path`, or use defaults when no file is given or it is missing
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No config file given, using defaults");
            return Ok(Self::default());
        };
        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;

        info!("Configuration loaded from {:?}", path);
        debug!("Config: {:?}", config);
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config
            .link
            .validate()
            .map_err(|e| anyhow!("Invalid link configuration: {:?}", e))?;
        Ok(config)
    }
}
