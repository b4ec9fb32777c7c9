//! Error types for CSI ingestion and analysis.
//!
//! Two layers of errors exist in this crate:
//!
//! - [`FrameError`] describes a malformed datagram. These are frame-local and
//!   recoverable: the ingest loop counts them and moves on to the next frame.
//! - [`CsiError`] covers everything else: socket setup, best-effort sends,
//!   capture files, configuration and task lifecycle.
//!
//! Decoding itself has no error type. Once a frame passes [`FrameError`]
//! validation the float unpacker is total over its payload.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use csiwatch::CsiError;
//!
//! let error = CsiError::transport_failed("192.168.2.10:9999", "host unreachable");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for CSI operations.
pub type Result<T, E = CsiError> = std::result::Result<T, E>;

/// A datagram that cannot be decoded as a CSI frame.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("Frame too short: need {needed} header bytes, got {got}")]
    TooShort { needed: usize, got: usize },

    #[error("Bad magic: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { expected: u32, found: u32 },

    #[error("Payload too small: need {needed} sample bytes, got {got}")]
    PayloadTooSmall { needed: usize, got: usize },
}

/// Main error type for CSI operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CsiError {
    #[error("Malformed frame: {0}")]
    Frame(#[from] FrameError),

    #[error("Failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport to {endpoint} failed: {reason}")]
    Transport {
        endpoint: String,
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Capture file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Ingest task failed: {reason}")]
    TaskFailed { reason: String },
}

impl CsiError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            CsiError::Frame(_) => true,
            CsiError::Transport { .. } => true,
            CsiError::Timeout { .. } => true,
            CsiError::Bind { .. } => false,
            CsiError::File { .. } => false,
            CsiError::Parse { .. } => false,
            CsiError::Config { .. } => false,
            CsiError::TaskFailed { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            CsiError::Frame(_) => vec![
                "Check that the sender emits BCM4366c0 CSI frames",
                "Verify the firmware patch writes the 0x11111111 magic",
                "Confirm the radio reports 64 subcarriers (20 MHz)",
            ],
            CsiError::Bind { .. } => vec![
                "Check that no other process is listening on the port",
                "Run with privileges sufficient for the chosen port",
                "Verify the listen address belongs to a local interface",
            ],
            CsiError::Transport { .. } => vec![
                "Verify the destination host is reachable",
                "Check that the collector is listening",
                "Inspect firewall rules between monitor and collector",
            ],
            CsiError::File { .. } => vec![
                "Check file exists and is readable",
                "Verify the capture is a hex dump of whole datagrams",
                "Check file permissions",
            ],
            CsiError::Parse { .. } => vec![
                "Check capture format",
                "Verify source data integrity",
                "Regenerate the capture from a packet trace",
            ],
            CsiError::Config { .. } => vec![
                "Use a finite, non-negative DC amplitude threshold",
                "Check endpoint addresses for typos",
            ],
            CsiError::Timeout { .. } => vec![
                "Increase timeout duration",
                "Check that the radio is producing CSI",
            ],
            CsiError::TaskFailed { .. } => vec![
                "Inspect earlier log output for the panic message",
                "Restart the monitor",
            ],
        }
    }

    /// Helper constructor for bind errors.
    pub fn bind_failed(addr: SocketAddr, source: std::io::Error) -> Self {
        CsiError::Bind { addr, source }
    }

    /// Helper constructor for transport errors without an I/O source.
    pub fn transport_failed(endpoint: impl ToString, reason: impl Into<String>) -> Self {
        CsiError::Transport { endpoint: endpoint.to_string(), reason: reason.into(), source: None }
    }

    /// Helper constructor for transport errors caused by socket I/O.
    pub fn transport_io(endpoint: impl ToString, source: std::io::Error) -> Self {
        CsiError::Transport {
            endpoint: endpoint.to_string(),
            reason: source.kind().to_string(),
            source: Some(source),
        }
    }

    /// Helper constructor for capture file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        CsiError::File { path, source }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(reason: impl Into<String>) -> Self {
        CsiError::Config { reason: reason.into() }
    }
}

impl From<std::io::Error> for CsiError {
    fn from(err: std::io::Error) -> Self {
        CsiError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}
