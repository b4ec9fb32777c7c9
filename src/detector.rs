//! DC-band blocking detection

use tracing::debug;

use crate::config::TriggerMode;
use crate::types::{DetectionEvent, DetectorState, SpectrumSnapshot};

/// True when `dc_band_amplitude` is strictly below `threshold`.
pub fn is_blocking(dc_band_amplitude: f64, threshold: f64) -> bool {
    dc_band_amplitude < threshold
}

/// Two-state detector over per-frame DC-band amplitudes.
///
/// Every frame is judged on its own; no debouncing. The state only decides
/// which blocking frames notify when running in [`TriggerMode::Edge`].
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    threshold: f64,
    mode: TriggerMode,
    state: DetectorState,
}

impl AnomalyDetector {
    pub fn new(threshold: f64, mode: TriggerMode) -> Self {
        Self { threshold, mode, state: DetectorState::Normal }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Judge one frame and return the event it triggers, if any.
    pub fn evaluate(&mut self, snapshot: &SpectrumSnapshot) -> Option<DetectionEvent> {
        let dc = snapshot.dc_band_amplitude;
        let previous = self.state;

        self.state = if is_blocking(dc, self.threshold) {
            DetectorState::Blocking
        } else {
            DetectorState::Normal
        };

        if self.state != previous {
            debug!(
                sequence = snapshot.header.sequence,
                dc_band_amplitude = dc,
                from = ?previous,
                to = ?self.state,
                "Detector state changed"
            );
        }

        let fire = match self.mode {
            TriggerMode::Level => self.state == DetectorState::Blocking,
            TriggerMode::Edge => {
                previous == DetectorState::Normal && self.state == DetectorState::Blocking
            }
        };

        fire.then(|| DetectionEvent {
            sequence: snapshot.header.sequence,
            station: snapshot.header.station,
            dc_band_amplitude: dc,
            threshold: self.threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FrameHeader, StationId};

    fn snapshot(sequence: u16, dc_band_amplitude: f64) -> SpectrumSnapshot {
        SpectrumSnapshot {
            header: FrameHeader::new(StationId::default(), sequence, 0, 0, 0),
            samples: Vec::new(),
            magnitudes: Vec::new(),
            average_amplitude: 0.0,
            dc_band_amplitude,
            phase_residual_std: 0.0,
            global_max_exponent: 0,
        }
    }

    #[test]
    fn threshold_is_strict() {
        let mut detector = AnomalyDetector::new(20.0, TriggerMode::Level);

        assert!(detector.evaluate(&snapshot(1, 20.0)).is_none());
        assert_eq!(detector.state(), DetectorState::Normal);

        let event = detector.evaluate(&snapshot(2, 19.0)).expect("one unit below fires");
        assert_eq!(event.sequence, 2);
        assert_eq!(event.dc_band_amplitude, 19.0);
        assert_eq!(event.threshold, 20.0);
        assert_eq!(detector.state(), DetectorState::Blocking);
    }

    #[test]
    fn level_mode_fires_on_every_blocking_frame() {
        let mut detector = AnomalyDetector::new(20.0, TriggerMode::Level);
        let fired: Vec<bool> = [5.0, 6.0, 25.0, 7.0]
            .iter()
            .enumerate()
            .map(|(i, &dc)| detector.evaluate(&snapshot(i as u16, dc)).is_some())
            .collect();

        assert_eq!(fired, vec![true, true, false, true]);
    }

    #[test]
    fn edge_mode_fires_once_per_episode() {
        let mut detector = AnomalyDetector::new(20.0, TriggerMode::Edge);
        let fired: Vec<bool> = [25.0, 5.0, 6.0, 7.0, 20.0, 3.0, 3.0]
            .iter()
            .enumerate()
            .map(|(i, &dc)| detector.evaluate(&snapshot(i as u16, dc)).is_some())
            .collect();

        assert_eq!(fired, vec![false, true, false, false, false, true, false]);
        assert_eq!(detector.state(), DetectorState::Blocking);
    }

    #[test]
    fn zero_threshold_never_fires() {
        let mut detector = AnomalyDetector::new(0.0, TriggerMode::Level);
        assert!(detector.evaluate(&snapshot(1, 0.0)).is_none());
    }
}
