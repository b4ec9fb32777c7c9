//! Per-frame decode and analysis.
//!
//! Composes the four stateless stages in order:
//! [`decode_frame`] → [`FloatUnpacker`] → [`SpectrumPostProcessor`] → [`AnomalyDetector`].
//! Only the detector carries anything from one frame to the next, and only
//! its edge-trigger state.

use std::sync::Arc;
use tracing::trace;

use crate::FrameError;
use crate::codec::{FloatUnpacker, decode_frame};
use crate::config::MonitorConfig;
use crate::detector::AnomalyDetector;
use crate::spectrum::SpectrumPostProcessor;
use crate::types::{DetectionEvent, SpectrumSnapshot};

/// Output of one processed frame.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub snapshot: Arc<SpectrumSnapshot>,
    pub event: Option<DetectionEvent>,
}

/// The decode-and-analyze chain for one monitor.
#[derive(Debug, Clone)]
pub struct Pipeline {
    unpacker: FloatUnpacker,
    post: SpectrumPostProcessor,
    detector: AnomalyDetector,
}

impl Pipeline {
    pub fn new(unpacker: FloatUnpacker, detector: AnomalyDetector) -> Self {
        Self { unpacker, post: SpectrumPostProcessor::new(), detector }
    }

    /// Build the chain described by a monitor configuration.
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            FloatUnpacker::new(config.autoscale),
            AnomalyDetector::new(config.dc_threshold, config.trigger),
        )
    }

    pub fn detector(&self) -> &AnomalyDetector {
        &self.detector
    }

    /// Decode and analyze one datagram.
    ///
    /// Malformed datagrams are rejected before any sample is decoded and leave
    /// the detector untouched.
    pub fn process(&mut self, datagram: &[u8]) -> Result<FrameAnalysis, FrameError> {
        let frame = decode_frame(datagram)?;
        let unpacked = self.unpacker.unpack(&frame.samples());

        trace!(
            sequence = frame.header.sequence,
            global_max_exponent = unpacked.global_max_exponent,
            shift = unpacked.shift,
            "Unpacked frame"
        );

        let snapshot = self.post.process(frame.header, unpacked);
        let event = self.detector.evaluate(&snapshot);

        Ok(FrameAnalysis { snapshot: Arc::new(snapshot), event })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}
