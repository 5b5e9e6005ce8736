//! pixlink host replay tool
//!
//! Feeds raw link captures through the decode, composite and flush pipeline
//! and saves the resulting shadow framebuffer as a PNG.
//!
//! ```text
//! pixlink-host [--config FILE] [--output FILE.png] CAPTURE...
//! ```

mod capture;
mod config;
mod shadow;

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use pixlink_core::{DisplayLink, LinkError};
use pixlink_raster::PixelSurface;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::capture::CaptureSource;
use crate::config::HostConfig;
use crate::shadow::ShadowFlush;

const USAGE: &str = "usage: pixlink-host [--config FILE] [--output FILE.png] CAPTURE...";

/// Command line arguments
#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    captures: Vec<PathBuf>,
}

impl Args {
    fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let value = args.next().with_context(|| format!("{arg} needs a file"))?;
                    parsed.config = Some(value.into());
                }
                "--output" | "-o" => {
                    let value = args.next().with_context(|| format!("{arg} needs a file"))?;
                    parsed.output = Some(value.into());
                }
                "--help" | "-h" => bail!(USAGE),
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    bail!("unknown option {flag}\n{USAGE}")
                }
                _ => parsed.captures.push(arg.into()),
            }
        }
        if parsed.captures.is_empty() {
            bail!("no capture files given\n{USAGE}");
        }
        Ok(parsed)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    let config = HostConfig::load(args.config.as_deref())?;
    let output = args.output.unwrap_or(config.output);
    let link_config = config.link;

    info!(
        "Starting pixlink replay: {}x{} surface, {} capture(s)",
        link_config.width,
        link_config.height,
        args.captures.len()
    );

    let (width, height) = (link_config.width, link_config.height);
    let storage = vec![0u8; PixelSurface::<Vec<u8>>::required_len(width, height)];
    let sink = ShadowFlush::new(width, height);
    let mut link = DisplayLink::new(&link_config, storage, sink)
        .map_err(|e| anyhow!("Failed to build display pipeline: {:?}", e))?;

    for path in &args.captures {
        let mut source = CaptureSource::open(path)
            .with_context(|| format!("Failed to open capture {}", path.display()))?;

        let flush_errors = link.stats().flush_errors;
        match link.pump(&mut source) {
            Ok(applied) => info!(
                "{}: {} bytes, {} frames applied",
                path.display(),
                source.delivered(),
                applied
            ),
            Err(LinkError::Source(e)) => {
                return Err(e).with_context(|| format!("Failed to read capture {}", path.display()))
            }
            Err(e) => bail!("{}: pipeline error: {:?}", path.display(), e),
        }
        let failed = link.stats().flush_errors.wrapping_sub(flush_errors);
        if failed > 0 {
            warn!("{}: {} flushes failed, region kept for retry", path.display(), failed);
        }
    }

    // Pushes everything under the manual policy, retries failed flushes otherwise
    link.flush()
        .map_err(|e| anyhow!("Final flush failed: {:?}", e))?;

    let stats = link.stats();
    let decoder = link.decoder_stats();
    info!(
        "Link: {} frames applied, {} payload errors, {} flushes, {} flush errors",
        stats.frames_applied, stats.payload_errors, stats.flushes, stats.flush_errors
    );
    info!(
        "Decoder: {} frames, {} checksum errors, {} sync losses, {} length errors, {} resets, {} bytes discarded",
        decoder.frames,
        decoder.checksum_errors,
        decoder.sync_losses,
        decoder.length_errors,
        decoder.link_resets,
        decoder.discarded_bytes
    );

    let (_, shadow) = link.into_parts();
    info!("Copied {} pixels to the shadow", shadow.pixels_copied());
    shadow.save(&output)
}
