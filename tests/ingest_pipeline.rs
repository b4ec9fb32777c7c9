//! End-to-end ingest tests over real sockets.
//!
//! Frames go in through the public providers, and alerts and telemetry come
//! out on loopback sockets exactly as an external collector would see them.

use anyhow::{Context, Result, ensure};
use futures::StreamExt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, UdpSocket};
use tokio::time::timeout;

use csiwatch::codec::{SUBCARRIER_COUNT, encode_frame};
use csiwatch::providers::{ReplayProvider, UdpProvider};
use csiwatch::sinks::ALERT_TOKEN;
use csiwatch::{
    CsiWatch, FrameHeader, Monitor, MonitorConfig, PackedSample, StationId, TriggerMode, UpdateRate,
};

const WAIT: Duration = Duration::from_secs(5);

fn capture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-data/frames/bcm4366c0_capture.hex")
}

fn loopback() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

fn frame(sequence: u16, word: PackedSample) -> Vec<u8> {
    let header = FrameHeader::new(StationId::new([2, 0, 0, 0, 0, 1]), sequence, 0, 0x1001, 0x006a);
    encode_frame(&header, &[word; SUBCARRIER_COUNT])
}

/// Flat spectrum far above the default threshold.
fn strong(sequence: u16) -> Vec<u8> {
    frame(sequence, PackedSample::pack(600, -400, 0))
}

/// All-zero spectrum, below any positive threshold.
fn silent(sequence: u16) -> Vec<u8> {
    frame(sequence, PackedSample::default())
}

async fn recv_alert(socket: &UdpSocket) -> Result<Vec<u8>> {
    let mut buf = [0u8; 128];
    let (len, _) = timeout(WAIT, socket.recv_from(&mut buf)).await.context("alert timed out")??;
    Ok(buf[..len].to_vec())
}

async fn wait_for_frames(monitor: &Monitor, frames: u64) -> Result<()> {
    timeout(WAIT, async {
        while monitor.stats().frames_received < frames {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .context("monitor did not receive all frames")
}

#[tokio::test]
async fn replayed_capture_raises_alert_and_streams_telemetry() -> Result<()> {
    let alerts = UdpSocket::bind(loopback()).await?;
    let collector = TcpListener::bind(loopback()).await?;

    let config = MonitorConfig {
        alert_destination: Some(alerts.local_addr()?),
        telemetry_destination: Some(collector.local_addr()?),
        ..MonitorConfig::default()
    };
    let mut monitor = CsiWatch::replay(capture_path(), &config).await?;

    let (conn, _) = timeout(WAIT, collector.accept()).await.context("no telemetry connection")??;
    let mut lines = BufReader::new(conn).lines();
    let record = timeout(WAIT, lines.next_line()).await??.context("telemetry closed early")?;

    let fields: Vec<&str> = record.split(',').collect();
    ensure!(fields.len() == 3 + 2 * SUBCARRIER_COUNT, "record has {} fields", fields.len());
    ensure!(fields[..3] == ["65535", "0", "0"], "header fields {:?}", &fields[..3]);
    ensure!(fields[3..5] == ["0", "0"], "guard subcarrier 0 must be zero");
    ensure!(fields[11..13] == ["630", "1495"], "subcarrier 4 is {:?}", &fields[11..13]);

    ensure!(recv_alert(&alerts).await? == ALERT_TOKEN);

    let stats = monitor.join().await?;
    ensure!(stats.frames_decoded == 1);
    ensure!(stats.events_emitted == 1);
    ensure!(stats.sink_failures == 0, "sink failures: {}", stats.sink_failures);
    Ok(())
}

#[tokio::test]
async fn live_listener_alerts_on_every_blocked_frame() -> Result<()> {
    let alerts = UdpSocket::bind(loopback()).await?;
    let provider = UdpProvider::bind(loopback()).await?;
    let target = provider.local_addr();

    let config = MonitorConfig {
        alert_destination: Some(alerts.local_addr()?),
        ..MonitorConfig::default()
    };
    let monitor = Monitor::start(provider, &config).await?;

    let radio = UdpSocket::bind(loopback()).await?;
    radio.send_to(&strong(1), target).await?;
    radio.send_to(&silent(2), target).await?;
    radio.send_to(b"not a csi frame", target).await?;
    radio.send_to(&silent(3), target).await?;

    wait_for_frames(&monitor, 4).await?;

    ensure!(recv_alert(&alerts).await? == ALERT_TOKEN);
    ensure!(recv_alert(&alerts).await? == ALERT_TOKEN);

    let latest = monitor.latest().context("snapshot after frames")?;
    ensure!(latest.header.sequence == 3);
    ensure!(latest.dc_band_amplitude == 0.0);

    let stats = monitor.shutdown().await?;
    ensure!(stats.frames_received == 4);
    ensure!(stats.frames_decoded == 3);
    ensure!(stats.too_short == 1);
    ensure!(stats.events_emitted == 2);
    Ok(())
}

#[tokio::test]
async fn edge_trigger_alerts_once_per_episode() -> Result<()> {
    let provider = UdpProvider::bind(loopback()).await?;
    let target = provider.local_addr();

    let config = MonitorConfig {
        alert_destination: None,
        trigger: TriggerMode::Edge,
        ..MonitorConfig::default()
    };
    let monitor = Monitor::start(provider, &config).await?;
    let mut events = Box::pin(monitor.events());

    let radio = UdpSocket::bind(loopback()).await?;
    for datagram in [silent(1), silent(2), strong(3), silent(4), silent(5)] {
        radio.send_to(&datagram, target).await?;
    }
    wait_for_frames(&monitor, 5).await?;

    let first = timeout(WAIT, events.next()).await?.context("first episode")?;
    let second = timeout(WAIT, events.next()).await?.context("second episode")?;
    ensure!(first.sequence == 1 && second.sequence == 4, "{first:?} {second:?}");

    let stats = monitor.shutdown().await?;
    ensure!(stats.events_emitted == 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn throttled_subscription_coalesces_and_flushes_final_snapshot() -> Result<()> {
    // Three frames 100 ms apart against a 1 Hz subscription: the first frame
    // passes on the immediate tick, the second is superseded, and the third is
    // held until the next tick even though the source has already ended.
    let provider =
        ReplayProvider::from_datagrams(vec![strong(1), strong(2), strong(3)]).with_rate(10.0);
    let config = MonitorConfig { alert_destination: None, ..MonitorConfig::default() };
    let mut monitor = Monitor::start(provider, &config).await?;

    let sequences: Vec<u16> = timeout(
        WAIT,
        monitor.subscribe(UpdateRate::Max(1)).map(|s| s.header.sequence).collect::<Vec<_>>(),
    )
    .await?;
    ensure!(sequences == [1, 3], "received {sequences:?}");

    let stats = monitor.join().await?;
    ensure!(stats.frames_decoded == 3);
    Ok(())
}

#[tokio::test]
async fn missing_capture_fails_at_startup() {
    let result = CsiWatch::replay("/nonexistent/capture.hex", &MonitorConfig::default()).await;
    assert!(result.is_err());
}
