//! Running monitor handle
//!
//! [`Monitor`] owns a spawned ingest task and exposes its output as streams
//! and point-in-time reads. Dropping the handle stops the task.

use futures::{Stream, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::driver::{Driver, IngestLoop};
use crate::pipeline::Pipeline;
use crate::provider::Provider;
use crate::providers::{ReplayProvider, UdpProvider};
use crate::sinks::{Sink, TcpTelemetrySink, UdpAlertSink};
use crate::stream::ThrottleExt;
use crate::types::{DetectionEvent, IngestStats, SpectrumSnapshot, UpdateRate};
use crate::{CsiError, Result};

/// Handle to a running ingest task
pub struct Monitor {
    snapshots: watch::Receiver<Option<Arc<SpectrumSnapshot>>>,
    events: broadcast::Receiver<DetectionEvent>,
    stats: watch::Receiver<IngestStats>,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<IngestStats>>>,
    source: String,
}

impl Monitor {
    /// Start ingesting from `provider` with sinks built from `config`.
    ///
    /// Fails if the configuration is invalid or a required outbound socket
    /// cannot be opened.
    pub async fn start<P: Provider>(provider: P, config: &MonitorConfig) -> Result<Self> {
        config.validate()?;

        let source = provider.describe();
        let sinks = build_sinks(config).await?;
        let ingest = IngestLoop::new(Pipeline::from_config(config), sinks);

        info!(
            %source,
            threshold = config.dc_threshold,
            trigger = ?config.trigger,
            autoscale = config.autoscale,
            "Starting monitor"
        );

        let channels = Driver::spawn(provider, ingest);

        Ok(Self {
            snapshots: channels.snapshots,
            events: channels.events,
            stats: channels.stats,
            cancel: channels.cancel,
            task: Some(channels.task),
            source,
        })
    }

    /// Listen for CSI datagrams on `config.listen`.
    pub async fn listen(config: &MonitorConfig) -> Result<Self> {
        let provider = UdpProvider::bind(config.listen).await?;
        Self::start(provider, config).await
    }

    /// Replay a recorded capture as fast as it can be processed.
    pub async fn replay<P: AsRef<Path>>(path: P, config: &MonitorConfig) -> Result<Self> {
        let provider = ReplayProvider::open(path)?;
        Self::start(provider, config).await
    }

    /// Description of the frame source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Stream of decoded snapshots.
    ///
    /// Starts with the current snapshot if one exists, then follows new
    /// frames. Snapshots published faster than the subscriber polls are
    /// coalesced to the newest. Ends when the source ends.
    pub fn subscribe(&self, rate: UpdateRate) -> impl Stream<Item = Arc<SpectrumSnapshot>> + 'static {
        let snapshots = WatchStream::new(self.snapshots.clone())
            .skip_while(|snapshot| {
                let waiting = snapshot.is_none();
                async move { waiting }
            })
            .take_while(|snapshot| {
                let live = snapshot.is_some();
                async move { live }
            })
            .filter_map(|snapshot| async move { snapshot });

        match rate.throttle_interval() {
            None => snapshots.boxed(),
            Some(period) => snapshots.throttle(period).boxed(),
        }
    }

    /// Stream of detection events raised after this call.
    pub fn events(&self) -> impl Stream<Item = DetectionEvent> + 'static {
        BroadcastStream::new(self.events.resubscribe()).filter_map(|event| async move {
            match event {
                Ok(event) => Some(event),
                Err(lagged) => {
                    warn!("Event subscriber fell behind: {}", lagged);
                    None
                }
            }
        })
    }

    /// Most recent snapshot, if the source is still running.
    pub fn latest(&self) -> Option<Arc<SpectrumSnapshot>> {
        self.snapshots.borrow().clone()
    }

    /// Wait until a snapshot is available.
    pub async fn wait_for_snapshot(&self, timeout: Duration) -> Result<Arc<SpectrumSnapshot>> {
        let mut snapshots = self.snapshots.clone();
        let waited = tokio::time::timeout(timeout, snapshots.wait_for(|s| s.is_some())).await;

        match waited {
            Ok(Ok(snapshot)) => snapshot
                .clone()
                .ok_or_else(|| CsiError::TaskFailed { reason: "snapshot vanished".to_string() }),
            Ok(Err(_)) => Err(CsiError::TaskFailed {
                reason: format!("{} ended before producing a frame", self.source),
            }),
            Err(_) => Err(CsiError::Timeout { duration: timeout }),
        }
    }

    /// Statistics as of the last processed frame.
    pub fn stats(&self) -> IngestStats {
        *self.stats.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Wait for the source to end and return the final statistics.
    ///
    /// Fails with [`CsiError::TaskFailed`] if the task gave up on its source
    /// or panicked; [`stats`](Self::stats) still holds the last counters.
    pub async fn join(&mut self) -> Result<IngestStats> {
        let Some(task) = self.task.take() else {
            return Ok(self.stats());
        };

        task.await.map_err(|e| CsiError::TaskFailed { reason: e.to_string() })?
    }

    /// Stop ingesting and return the final statistics.
    pub async fn shutdown(mut self) -> Result<IngestStats> {
        debug!(source = %self.source, "Shutting down monitor");
        self.cancel.cancel();
        self.join().await
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn build_sinks(config: &MonitorConfig) -> Result<Vec<Box<dyn Sink>>> {
    let mut sinks: Vec<Box<dyn Sink>> = Vec::new();

    if let Some(destination) = config.telemetry_destination {
        sinks.push(Box::new(TcpTelemetrySink::new(destination)));
    }
    if let Some(destination) = config.alert_destination {
        sinks.push(Box::new(UdpAlertSink::connect(destination).await?));
    }

    Ok(sinks)
}
