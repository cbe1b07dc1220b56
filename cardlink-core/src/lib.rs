//! # cardlink-core
//!
//! Core protocol implementation for serial-attached security cards.
//!
//! This crate provides the low-level protocol primitives:
//! - Wire packet framing and channel encoding/decoding
//! - Command verb definitions and command-line building
//! - Connection state machine with monitor notification
//! - Protocol constants

pub mod command;
pub mod constants;
pub mod error;
pub mod packet;
pub mod session;

pub use command::Command;
pub use error::{Error, Result};
pub use packet::Packet;
pub use session::{ConnectionState, ConnectionTracker, Monitor};

/// Protocol version information
pub const PROTOCOL_VERSION: &str = "1.0";

/// Command channel identifier
pub const COMMAND_CHANNEL: u8 = 1;

/// Data channel identifier
pub const DATA_CHANNEL: u8 = 2;

/// Maximum conventional payload per packet
pub const MAX_PAYLOAD_SIZE: usize = 512;
