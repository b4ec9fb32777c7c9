//! Frame source implementations

pub mod replay;
pub mod udp;

pub use replay::{ReplayProvider, parse_hex_dump};
pub use udp::UdpProvider;
