//! Blocking detection events

use serde::{Deserialize, Serialize};

use super::StationId;

/// Detector state. Only used to decide which frames notify in edge mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetectorState {
    #[default]
    Normal,
    Blocking,
}

/// Emitted when the DC-band amplitude falls strictly below the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    /// Sequence number of the triggering frame
    pub sequence: u16,

    /// Station that triggered the CSI report
    pub station: StationId,

    /// DC-band average amplitude of the triggering frame
    pub dc_band_amplitude: f64,

    /// Threshold in force when the event fired
    pub threshold: f64,
}
