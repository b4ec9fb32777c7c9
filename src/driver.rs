//! Driver spawns and manages the ingest task

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::pipeline::{FrameAnalysis, Pipeline};
use crate::provider::Provider;
use crate::sinks::Sink;
use crate::types::{DetectionEvent, IngestStats, RawFrame, SpectrumSnapshot};
use crate::{CsiError, Result};

/// Consecutive provider errors tolerated before the task gives up.
const MAX_ERRORS: u32 = 10;

/// Buffered detection events per subscriber.
const EVENT_CAPACITY: usize = 64;

/// Processes frames one at a time, in arrival order.
///
/// Owns the pipeline and sinks but not the statistics, which the caller
/// passes into every [`step`](Self::step).
pub struct IngestLoop {
    pipeline: Pipeline,
    sinks: Vec<Box<dyn Sink>>,
}

impl IngestLoop {
    pub fn new(pipeline: Pipeline, sinks: Vec<Box<dyn Sink>>) -> Self {
        Self { pipeline, sinks }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Handle one datagram.
    ///
    /// Malformed frames are counted and skipped. Sink failures are counted
    /// and logged; they never abort the frame.
    pub async fn step(&mut self, frame: &RawFrame, stats: &mut IngestStats) -> Option<FrameAnalysis> {
        stats.frames_received += 1;
        stats.bytes_received += frame.len() as u64;

        let analysis = match self.pipeline.process(&frame.data) {
            Ok(analysis) => analysis,
            Err(e) => {
                stats.record_rejection(&e);
                debug!(len = frame.len(), source = ?frame.source, "Dropping frame: {}", e);
                return None;
            }
        };
        stats.frames_decoded += 1;

        let snapshot = &analysis.snapshot;
        debug!(
            sequence = snapshot.header.sequence,
            core = snapshot.header.core,
            stream = snapshot.header.stream,
            average_amplitude = snapshot.average_amplitude,
            dc_band_amplitude = snapshot.dc_band_amplitude,
            "Frame decoded"
        );

        for sink in &mut self.sinks {
            if let Err(e) = sink.publish_snapshot(snapshot).await {
                stats.sink_failures += 1;
                warn!(sink = sink.name(), "Telemetry send failed: {}", e);
            }
        }

        if let Some(event) = &analysis.event {
            stats.events_emitted += 1;
            warn!(
                sequence = event.sequence,
                station = %event.station,
                dc_band_amplitude = event.dc_band_amplitude,
                threshold = event.threshold,
                "Blocking detected"
            );

            for sink in &mut self.sinks {
                if let Err(e) = sink.publish_event(event).await {
                    stats.sink_failures += 1;
                    warn!(sink = sink.name(), "Alert send failed: {}", e);
                }
            }
        }

        Some(analysis)
    }
}

/// Result of spawning the ingest task
pub struct DriverChannels {
    /// Latest decoded snapshot; `None` until the first frame and after the source ends
    pub snapshots: watch::Receiver<Option<Arc<SpectrumSnapshot>>>,

    /// Detection events; call `resubscribe` for an independent receiver
    pub events: broadcast::Receiver<DetectionEvent>,

    /// Statistics, republished after every frame
    pub stats: watch::Receiver<IngestStats>,

    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,

    /// Resolves to the final statistics when the source ends or the task is
    /// cancelled, or to [`CsiError::TaskFailed`] when receiving gave up
    pub task: JoinHandle<Result<IngestStats>>,
}

/// Spawns the task that owns the provider and the ingest loop.
pub struct Driver;

impl Driver {
    /// Spawn the ingest task for `provider`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<P>(provider: P, ingest: IngestLoop) -> DriverChannels
    where
        P: Provider,
    {
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (event_tx, event_rx) = broadcast::channel(EVENT_CAPACITY);
        let (stats_tx, stats_rx) = watch::channel(IngestStats::default());
        let cancel = CancellationToken::new();

        let task = tokio::spawn(Self::ingest_task(
            provider,
            ingest,
            Outputs { snapshots: snapshot_tx, events: event_tx, stats: stats_tx },
            cancel.clone(),
        ));

        DriverChannels {
            snapshots: snapshot_rx,
            events: event_rx,
            stats: stats_rx,
            cancel,
            task,
        }
    }

    async fn ingest_task<P>(
        mut provider: P,
        mut ingest: IngestLoop,
        outputs: Outputs,
        cancel: CancellationToken,
    ) -> Result<IngestStats>
    where
        P: Provider,
    {
        let source = provider.describe();
        info!(%source, "Ingest task started");

        let mut stats = IngestStats::default();
        let mut error_count = 0u32;
        let mut failure = None;

        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Ingest task cancelled");
                    break;
                }
                result = provider.next_frame() => result,
            };

            match result {
                Ok(Some(frame)) => {
                    error_count = 0;

                    if let Some(analysis) = ingest.step(&frame, &mut stats).await {
                        if let Some(event) = analysis.event {
                            // No subscribers is not an error.
                            let _ = outputs.events.send(event);
                        }
                        outputs.snapshots.send_replace(Some(analysis.snapshot));
                    }
                    outputs.stats.send_replace(stats);
                }
                Ok(None) => {
                    info!(%source, "Source ended after {} frames", stats.frames_received);
                    break;
                }
                Err(e) => {
                    stats.receive_errors += 1;
                    outputs.stats.send_replace(stats);
                    error_count += 1;
                    error!("Receive error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if !e.is_retryable() || error_count >= MAX_ERRORS {
                        error!("Giving up on {}", source);
                        failure = Some(CsiError::TaskFailed {
                            reason: format!(
                                "gave up on {} after {} receive errors: {}",
                                source, error_count, e
                            ),
                        });
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ... capped at 1.6s
                    let backoff = Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        outputs.snapshots.send_replace(None);
        outputs.stats.send_replace(stats);

        info!(
            frames_received = stats.frames_received,
            frames_decoded = stats.frames_decoded,
            frames_rejected = stats.frames_rejected(),
            events_emitted = stats.events_emitted,
            sink_failures = stats.sink_failures,
            "Ingest task ended"
        );

        match failure {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }
}

struct Outputs {
    snapshots: watch::Sender<Option<Arc<SpectrumSnapshot>>>,
    events: broadcast::Sender<DetectionEvent>,
    stats: watch::Sender<IngestStats>,
}
