//! Line-oriented CSI telemetry over TCP
//!
//! Each decoded frame becomes one record:
//! `sequence,core,stream,r0,i0,r1,i1,...` terminated by `\n`.

use std::fmt::Write as _;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::{Duration, Instant, timeout};
use tracing::{debug, info, warn};

use super::Sink;
use crate::types::SpectrumSnapshot;
use crate::{CsiError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Minimum wait before reconnecting after a failure.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Render one snapshot as a telemetry record, newline included.
pub fn format_telemetry_record(snapshot: &SpectrumSnapshot) -> String {
    let header = &snapshot.header;
    let mut line = String::with_capacity(16 + snapshot.samples.len() * 12);

    // Writing into a String cannot fail.
    let _ = write!(line, "{},{},{}", header.sequence, header.core, header.stream);
    for sample in &snapshot.samples {
        let _ = write!(line, ",{},{}", sample.real, sample.imag);
    }
    line.push('\n');
    line
}

/// Streams telemetry records to a collector.
///
/// The connection is opened lazily and re-opened after failures, at most
/// once per [`RECONNECT_DELAY`]. Records produced while disconnected are
/// dropped.
pub struct TcpTelemetrySink {
    destination: SocketAddr,
    stream: Option<TcpStream>,
    retry_after: Option<Instant>,
}

impl TcpTelemetrySink {
    pub fn new(destination: SocketAddr) -> Self {
        info!(%destination, "Telemetry stream enabled");
        Self { destination, stream: None, retry_after: None }
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn connected(&mut self) -> Result<&mut TcpStream> {
        if self.stream.is_none() {
            if let Some(at) = self.retry_after {
                if Instant::now() < at {
                    return Err(CsiError::transport_failed(
                        self.destination,
                        "collector unavailable, waiting to reconnect",
                    ));
                }
            }

            let stream = match timeout(CONNECT_TIMEOUT, TcpStream::connect(self.destination)).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    self.retry_after = Some(Instant::now() + RECONNECT_DELAY);
                    return Err(CsiError::transport_io(self.destination, e));
                }
                Err(_) => {
                    self.retry_after = Some(Instant::now() + RECONNECT_DELAY);
                    return Err(CsiError::Timeout { duration: CONNECT_TIMEOUT });
                }
            };

            // Records are small and latency matters more than batching.
            if let Err(e) = stream.set_nodelay(true) {
                debug!("Could not disable Nagle on telemetry stream: {}", e);
            }

            info!(destination = %self.destination, "Telemetry collector connected");
            self.retry_after = None;
            self.stream = Some(stream);
        }

        self.stream
            .as_mut()
            .ok_or_else(|| CsiError::transport_failed(self.destination, "not connected"))
    }
}

#[async_trait::async_trait]
impl Sink for TcpTelemetrySink {
    async fn publish_snapshot(&mut self, snapshot: &SpectrumSnapshot) -> Result<()> {
        let record = format_telemetry_record(snapshot);
        let destination = self.destination;
        let written = self.connected().await?.write_all(record.as_bytes()).await;

        if let Err(e) = written {
            warn!(%destination, "Telemetry collector disconnected: {}", e);
            self.stream = None;
            self.retry_after = Some(Instant::now() + RECONNECT_DELAY);
            return Err(CsiError::transport_io(destination, e));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "telemetry"
    }
}
