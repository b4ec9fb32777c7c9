//! Monitor configuration.
//!
//! All values are fixed at process start. There is no configuration file;
//! the binary maps its command-line flags onto [`MonitorConfig`].

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::{CsiError, Result};

/// UDP port the firmware streams CSI to.
pub const DEFAULT_LISTEN_PORT: u16 = 5500;

/// Port of the feedback tool that consumes blocking alerts.
pub const DEFAULT_ALERT_PORT: u16 = 9999;

/// DC-band amplitude below which a frame counts as blocked.
pub const DEFAULT_DC_THRESHOLD: f64 = 20.0;

/// Which frames emit a [`crate::DetectionEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Every frame below threshold
    #[default]
    Level,

    /// Only the first frame of each blocking episode
    Edge,
}

/// Complete monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Address the CSI listener binds to
    pub listen: SocketAddr,

    /// Where blocking alerts are sent, if anywhere
    pub alert_destination: Option<SocketAddr>,

    /// Collector for per-frame telemetry records, if any
    pub telemetry_destination: Option<SocketAddr>,

    /// DC-band amplitude threshold
    pub dc_threshold: f64,

    pub trigger: TriggerMode,

    /// Discover a shared exponent per frame
    pub autoscale: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_LISTEN_PORT),
            alert_destination: Some(SocketAddr::new(
                IpAddr::V4(Ipv4Addr::new(192, 168, 2, 10)),
                DEFAULT_ALERT_PORT,
            )),
            telemetry_destination: None,
            dc_threshold: DEFAULT_DC_THRESHOLD,
            trigger: TriggerMode::Level,
            autoscale: true,
        }
    }
}

impl MonitorConfig {
    /// Check values that cannot be expressed in the types.
    pub fn validate(&self) -> Result<()> {
        if !self.dc_threshold.is_finite() {
            return Err(CsiError::config_error(format!(
                "DC threshold must be finite, got {}",
                self.dc_threshold
            )));
        }
        if self.dc_threshold < 0.0 {
            return Err(CsiError::config_error(format!(
                "DC threshold cannot be negative, got {}",
                self.dc_threshold
            )));
        }
        Ok(())
    }
}
