//! Ingest statistics

use serde::{Deserialize, Serialize};

use crate::FrameError;

/// Counters owned by the ingest loop.
///
/// Published after every frame and returned when the loop finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IngestStats {
    pub frames_received: u64,
    pub bytes_received: u64,
    pub frames_decoded: u64,
    pub too_short: u64,
    pub bad_magic: u64,
    pub payload_too_small: u64,
    pub events_emitted: u64,
    pub sink_failures: u64,
    pub receive_errors: u64,
}

impl IngestStats {
    /// Count a rejected frame under its error kind.
    pub fn record_rejection(&mut self, error: &FrameError) {
        match error {
            FrameError::TooShort { .. } => self.too_short += 1,
            FrameError::BadMagic { .. } => self.bad_magic += 1,
            FrameError::PayloadTooSmall { .. } => self.payload_too_small += 1,
        }
    }

    /// Total malformed frames.
    pub fn frames_rejected(&self) -> u64 {
        self.too_short + self.bad_magic + self.payload_too_small
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_counted_by_kind() {
        let mut stats = IngestStats::default();
        stats.record_rejection(&FrameError::TooShort { needed: 18, got: 2 });
        stats.record_rejection(&FrameError::BadMagic { expected: 0x1111_1111, found: 0 });
        stats.record_rejection(&FrameError::BadMagic { expected: 0x1111_1111, found: 1 });
        stats.record_rejection(&FrameError::PayloadTooSmall { needed: 256, got: 4 });

        assert_eq!(stats.too_short, 1);
        assert_eq!(stats.bad_magic, 2);
        assert_eq!(stats.payload_too_small, 1);
        assert_eq!(stats.frames_rejected(), 4);
    }
}
