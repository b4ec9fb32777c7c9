//! RF blocking detection from Broadcom BCM4366c0 channel state information.
//!
//! The radio's CSI extractor firmware streams one UDP datagram per received
//! packet: an 18-byte header followed by 64 packed subcarrier samples that
//! share a floating-point exponent. `csiwatch` decodes those frames into
//! integer complex samples, suppresses the guard subcarriers and flags frames
//! whose energy next to DC collapses, the signature of an active blocker.
//!
//! # Features
//!
//! - **Bit-exact decoding**: the two-pass shared-exponent unpack of the vendor tools
//! - **Detection**: DC-band amplitude thresholding with level or edge triggering
//! - **Outputs**: a UDP alert datagram and an optional TCP telemetry stream
//! - **Replay**: hex-dump captures run through the same pipeline as live traffic
//!
//! ## Example (live)
//!
//! ```rust,no_run
//! use csiwatch::{CsiWatch, MonitorConfig, UpdateRate};
//! use futures::StreamExt;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> csiwatch::Result<()> {
//!     let monitor = CsiWatch::listen(&MonitorConfig::default()).await?;
//!     let mut snapshots = monitor.subscribe(UpdateRate::Max(2));
//!
//!     while let Some(snapshot) = snapshots.next().await {
//!         println!("seq {} dc {:.1}", snapshot.header.sequence, snapshot.dc_band_amplitude);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Example (single frame)
//!
//! ```rust
//! use csiwatch::pipeline::Pipeline;
//!
//! let mut pipeline = Pipeline::default();
//! assert!(pipeline.process(&[0u8; 4]).is_err());
//! ```

pub mod codec;
pub mod config;
pub mod detector;
pub mod driver;
mod error;
pub mod monitor;
pub mod pipeline;
pub mod provider;
pub mod providers;
pub mod sinks;
pub mod spectrum;
pub mod stream;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

pub use config::{MonitorConfig, TriggerMode};
pub use error::*;
pub use monitor::Monitor;
pub use types::*;

/// Entry point for starting a monitor.
///
/// # Examples
///
/// ```rust,no_run
/// use csiwatch::{CsiWatch, MonitorConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> csiwatch::Result<()> {
/// let mut monitor = CsiWatch::replay("capture.hex", &MonitorConfig::default()).await?;
/// let stats = monitor.join().await?;
/// println!("{} blocking frames", stats.events_emitted);
/// # Ok(())
/// # }
/// ```
pub struct CsiWatch;

impl CsiWatch {
    /// Listen for live CSI on `config.listen`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The listen address cannot be bound
    /// - The alert socket cannot be opened
    pub async fn listen(config: &MonitorConfig) -> Result<Monitor> {
        Monitor::listen(config).await
    }

    /// Replay a hex-dump capture through the same pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the capture cannot be read or parsed, or for any
    /// of the reasons [`CsiWatch::listen`] fails other than binding.
    pub async fn replay<P: AsRef<std::path::Path>>(path: P, config: &MonitorConfig) -> Result<Monitor> {
        Monitor::replay(path, config).await
    }
}
