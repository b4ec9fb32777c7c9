//! Provider trait for inbound frame sources

use crate::Result;
use crate::types::RawFrame;

/// Source of raw CSI datagrams.
///
/// Providers abstract over the live UDP listener and recorded captures, and
/// handle their own timing: the listener waits on the socket, replay paces
/// itself if asked to.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Wait for the next datagram.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` - a datagram arrived
    /// - `Ok(None)` - the source is exhausted (normal termination)
    /// - `Err(e)` - receiving failed; the caller decides whether to retry
    async fn next_frame(&mut self) -> Result<Option<RawFrame>>;

    /// Human-readable description of the source for logs.
    fn describe(&self) -> String;
}
