//! Raw frame packets received from a provider

use std::net::SocketAddr;
use std::sync::Arc;

/// One inbound datagram, exactly as received.
///
/// Frames are never retained past their processing; the payload is shared
/// via `Arc` only so providers can hand it off without copying again.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Datagram bytes
    pub data: Arc<[u8]>,

    /// Sender, when the transport reports one
    pub source: Option<SocketAddr>,
}

impl RawFrame {
    /// Create a new raw frame
    pub fn new(data: impl Into<Arc<[u8]>>, source: Option<SocketAddr>) -> Self {
        Self { data: data.into(), source }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
