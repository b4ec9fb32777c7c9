//! Blocking alert datagrams

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::{debug, info};

use super::Sink;
use crate::types::DetectionEvent;
use crate::{CsiError, Result};

/// Payload sent to the feedback tool when blocking is detected.
pub const ALERT_TOKEN: &[u8] = b"BLOCKING_DETECTED";

/// Sends [`ALERT_TOKEN`] as a single datagram per detection event.
pub struct UdpAlertSink {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl UdpAlertSink {
    /// Open the outbound socket. Failure here is a setup error.
    pub async fn connect(destination: SocketAddr) -> Result<Self> {
        let local = match destination {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        let socket = UdpSocket::bind(local).await.map_err(|e| CsiError::bind_failed(local, e))?;

        info!(%destination, "Blocking alerts enabled");

        Ok(Self { socket, destination })
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }
}

#[async_trait::async_trait]
impl Sink for UdpAlertSink {
    async fn publish_event(&mut self, event: &DetectionEvent) -> Result<()> {
        self.socket
            .send_to(ALERT_TOKEN, self.destination)
            .await
            .map_err(|e| CsiError::transport_io(self.destination, e))?;

        debug!(sequence = event.sequence, destination = %self.destination, "Alert sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "alert"
    }
}
