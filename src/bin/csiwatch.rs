//! csiwatch command-line monitor
//!
//! Listens for BCM4366c0 CSI datagrams (or replays a capture), alerts the
//! feedback tool on blocking and optionally streams telemetry to a collector.

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use csiwatch::config::{DEFAULT_DC_THRESHOLD, MonitorConfig, TriggerMode};
use csiwatch::{IngestStats, Monitor};

#[derive(Debug, Parser)]
#[command(name = "csiwatch", version, about = "Detect RF blocking from BCM4366c0 CSI")]
struct Cli {
    /// Address to receive CSI datagrams on
    #[arg(long, default_value = "0.0.0.0:5500")]
    listen: SocketAddr,

    /// Where to send BLOCKING_DETECTED alerts
    #[arg(long, default_value = "192.168.2.10:9999", conflicts_with = "no_alert")]
    alert: SocketAddr,

    /// Do not send alerts
    #[arg(long)]
    no_alert: bool,

    /// Stream per-frame telemetry records to this TCP collector
    #[arg(long)]
    telemetry: Option<SocketAddr>,

    /// DC-band amplitude below which a frame counts as blocked
    #[arg(long, default_value_t = DEFAULT_DC_THRESHOLD)]
    threshold: f64,

    /// Alert once per blocking episode instead of on every blocked frame
    #[arg(long)]
    edge: bool,

    /// Scale each sample by its own exponent only
    #[arg(long)]
    no_autoscale: bool,

    /// Replay a hex-dump capture instead of listening
    #[arg(long, value_name = "PATH")]
    replay: Option<PathBuf>,

    /// Log per-frame detail
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> MonitorConfig {
        MonitorConfig {
            listen: self.listen,
            alert_destination: (!self.no_alert).then_some(self.alert),
            telemetry_destination: self.telemetry,
            dc_threshold: self.threshold,
            trigger: if self.edge { TriggerMode::Edge } else { TriggerMode::Level },
            autoscale: !self.no_autoscale,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = cli.config();

    let mut monitor = match &cli.replay {
        Some(path) => Monitor::replay(path, &config)
            .await
            .with_context(|| format!("replaying {}", path.display()))?,
        None => Monitor::listen(&config)
            .await
            .with_context(|| format!("listening on {}", config.listen))?,
    };

    let stats = tokio::select! {
        joined = monitor.join() => match joined {
            Ok(stats) => stats,
            Err(e) => {
                report(&monitor.stats());
                return Err(e).context("ingest stopped");
            }
        },
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!("Could not wait for Ctrl-C: {}", e);
            }
            info!("Interrupted");
            monitor.shutdown().await?
        }
    };

    report(&stats);
    Ok(())
}

fn report(stats: &IngestStats) {
    info!(
        frames_received = stats.frames_received,
        frames_decoded = stats.frames_decoded,
        too_short = stats.too_short,
        bad_magic = stats.bad_magic,
        payload_too_small = stats.payload_too_small,
        events_emitted = stats.events_emitted,
        sink_failures = stats.sink_failures,
        receive_errors = stats.receive_errors,
        "Final statistics"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_library_config() {
        let cli = Cli::parse_from(["csiwatch"]);
        assert_eq!(cli.config(), MonitorConfig::default());
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::parse_from([
            "csiwatch",
            "--listen",
            "127.0.0.1:6000",
            "--no-alert",
            "--telemetry",
            "10.0.0.2:7000",
            "--threshold",
            "12.5",
            "--edge",
            "--no-autoscale",
        ]);
        let config = cli.config();

        assert_eq!(config.listen, "127.0.0.1:6000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.alert_destination, None);
        assert_eq!(config.telemetry_destination, Some("10.0.0.2:7000".parse::<SocketAddr>().unwrap()));
        assert_eq!(config.dc_threshold, 12.5);
        assert_eq!(config.trigger, TriggerMode::Edge);
        assert!(!config.autoscale);
    }

    #[test]
    fn alert_and_no_alert_conflict() {
        assert!(Cli::try_parse_from(["csiwatch", "--alert", "1.2.3.4:5", "--no-alert"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
