//! Outbound channels for detection events and per-frame telemetry
//!
//! Sinks are best-effort: a failed send is counted and logged by the ingest
//! loop, never escalated.

pub mod alert;
pub mod telemetry;

pub use alert::{ALERT_TOKEN, UdpAlertSink};
pub use telemetry::{TcpTelemetrySink, format_telemetry_record};

use crate::Result;
use crate::types::{DetectionEvent, SpectrumSnapshot};

/// Receiver of ingest output.
///
/// Both methods default to doing nothing so a sink only implements what it
/// consumes.
#[async_trait::async_trait]
pub trait Sink: Send + 'static {
    /// Called once per decoded frame.
    async fn publish_snapshot(&mut self, _snapshot: &SpectrumSnapshot) -> Result<()> {
        Ok(())
    }

    /// Called for every detection event.
    async fn publish_event(&mut self, _event: &DetectionEvent) -> Result<()> {
        Ok(())
    }

    /// Name used in logs.
    fn name(&self) -> &'static str;
}
