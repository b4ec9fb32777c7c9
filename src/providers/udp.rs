//! Live UDP listener

use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{info, trace};

use crate::provider::Provider;
use crate::types::RawFrame;
use crate::{CsiError, Result};

/// Largest datagram a UDP socket can deliver.
const MAX_DATAGRAM: usize = 65_535;

/// Receives one CSI frame per datagram from the firmware.
pub struct UdpProvider {
    socket: UdpSocket,
    local_addr: SocketAddr,
    buffer: Box<[u8]>,
}

impl UdpProvider {
    /// Bind the listener. Failure here is fatal to the monitor.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await.map_err(|e| CsiError::bind_failed(addr, e))?;
        let local_addr = socket.local_addr().map_err(|e| CsiError::bind_failed(addr, e))?;

        info!(%local_addr, "Listening for CSI frames");

        Ok(Self { socket, local_addr, buffer: vec![0u8; MAX_DATAGRAM].into_boxed_slice() })
    }

    /// Address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait::async_trait]
impl Provider for UdpProvider {
    async fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        let (len, source) = self
            .socket
            .recv_from(&mut self.buffer)
            .await
            .map_err(|e| CsiError::transport_io(self.local_addr, e))?;

        trace!(len, %source, "Datagram received");

        Ok(Some(RawFrame::new(&self.buffer[..len], Some(source))))
    }

    fn describe(&self) -> String {
        format!("udp://{}", self.local_addr)
    }
}
