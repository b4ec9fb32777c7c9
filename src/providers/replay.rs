//! Replay provider for recorded CSI captures
//!
//! Captures are plain-text hex dumps: whitespace-separated byte pairs, one
//! datagram per block, blocks separated by blank lines. Lines starting with
//! `#` are comments.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::provider::Provider;
use crate::types::RawFrame;
use crate::{CsiError, Result};

/// Parse a hex-dump capture into datagrams.
pub fn parse_hex_dump(text: &str) -> Result<Vec<Vec<u8>>> {
    let mut datagrams = Vec::new();
    let mut current = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();

        if line.starts_with('#') {
            continue;
        }
        if line.is_empty() {
            if !current.is_empty() {
                datagrams.push(std::mem::take(&mut current));
            }
            continue;
        }

        for token in line.split_whitespace() {
            let byte = (token.len() == 2)
                .then(|| u8::from_str_radix(token, 16).ok())
                .flatten()
                .ok_or_else(|| CsiError::Parse {
                    context: format!("hex dump line {}", line_no + 1),
                    details: format!("'{}' is not a hex byte", token),
                })?;
            current.push(byte);
        }
    }

    if !current.is_empty() {
        datagrams.push(current);
    }

    Ok(datagrams)
}

/// Replays recorded datagrams in file order.
pub struct ReplayProvider {
    datagrams: VecDeque<Vec<u8>>,
    total: usize,
    origin: Option<PathBuf>,

    /// Frame pacing, when replaying at a fixed rate
    interval: Option<Interval>,
}

impl ReplayProvider {
    /// Load a capture file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| CsiError::file_error(path.to_path_buf(), e))?;
        let datagrams = parse_hex_dump(&text)?;

        info!("Opened capture {}: {} datagrams", path.display(), datagrams.len());

        let mut provider = Self::from_datagrams(datagrams);
        provider.origin = Some(path.to_path_buf());
        Ok(provider)
    }

    /// Replay datagrams held in memory.
    pub fn from_datagrams(datagrams: Vec<Vec<u8>>) -> Self {
        let total = datagrams.len();
        Self { datagrams: datagrams.into(), total, origin: None, interval: None }
    }

    /// Pace delivery to at most `hz` datagrams per second. Zero disables pacing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_rate(mut self, hz: f64) -> Self {
        self.interval = (hz > 0.0 && hz.is_finite()).then(|| {
            let mut interval = interval(Duration::from_secs_f64(1.0 / hz));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        debug!("Replay rate set to {} Hz", hz);
        self
    }

    /// Datagrams not yet delivered.
    pub fn remaining(&self) -> usize {
        self.datagrams.len()
    }

    /// Datagrams in the capture.
    pub fn total(&self) -> usize {
        self.total
    }
}

#[async_trait::async_trait]
impl Provider for ReplayProvider {
    async fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        // When paced, the end of the capture also arrives on a tick.
        if let Some(interval) = self.interval.as_mut() {
            interval.tick().await;
        }

        let Some(datagram) = self.datagrams.pop_front() else {
            debug!("Reached end of replay");
            return Ok(None);
        };

        Ok(Some(RawFrame::new(datagram, None)))
    }

    fn describe(&self) -> String {
        match &self.origin {
            Some(path) => format!("replay://{}", path.display()),
            None => format!("replay://memory ({} datagrams)", self.total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn parses_blocks_and_skips_comments() {
        let text = "# capture\n11 11\n  aa BB \n\n\n# second\n00\n";
        let datagrams = parse_hex_dump(text).expect("valid dump");

        assert_eq!(datagrams, vec![vec![0x11, 0x11, 0xaa, 0xbb], vec![0x00]]);
    }

    #[test]
    fn rejects_malformed_tokens() {
        for text in ["11 1\n", "zz\n", "112\n"] {
            let err = parse_hex_dump(text).unwrap_err();
            assert!(matches!(err, CsiError::Parse { .. }), "{text:?}: {err}");
        }
    }

    #[test]
    fn empty_dump_has_no_datagrams() {
        assert!(parse_hex_dump("# nothing here\n\n").expect("valid").is_empty());
    }

    #[tokio::test]
    async fn replays_in_order_then_ends() {
        let mut provider = ReplayProvider::from_datagrams(vec![vec![1], vec![2, 2]]);
        assert_eq!(provider.total(), 2);

        let first = provider.next_frame().await.expect("ok").expect("frame");
        let second = provider.next_frame().await.expect("ok").expect("frame");

        assert_eq!(&*first.data, &[1]);
        assert_eq!(&*second.data, &[2, 2]);
        assert!(first.source.is_none());
        assert_eq!(provider.remaining(), 0);
        assert!(provider.next_frame().await.expect("ok").is_none());
        assert!(provider.next_frame().await.expect("ok").is_none());
    }

    #[tokio::test]
    async fn opens_recorded_capture() {
        let path = test_utils::capture_fixture_path();
        let mut provider = ReplayProvider::open(&path).expect("capture opens");

        assert_eq!(provider.total(), 1);
        assert!(provider.describe().ends_with("bcm4366c0_capture.hex"));

        let frame = provider.next_frame().await.expect("ok").expect("frame");
        assert_eq!(frame.len(), 274);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = match ReplayProvider::open("/nonexistent/capture.hex") {
            Ok(_) => panic!("missing capture should not open"),
            Err(e) => e,
        };

        match err {
            CsiError::File { path, .. } => assert_eq!(path, PathBuf::from("/nonexistent/capture.hex")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn paced_replay_waits_between_frames() {
        let mut provider =
            ReplayProvider::from_datagrams(vec![vec![1], vec![2], vec![3]]).with_rate(10.0);
        let start = tokio::time::Instant::now();

        while provider.next_frame().await.expect("ok").is_some() {}

        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
