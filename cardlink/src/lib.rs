//! # cardlink
//!
//! Async client for the card's file-oriented command protocol over an
//! unreliable serial link.
//!
//! ## Features
//!
//! - Framed two-channel packet codec with a background reader task
//! - FTP-style command set (list, get, put, rename, delete, finalize)
//! - Async/await API using Tokio
//! - Cooperative abort of in-flight transfers
//!
//! ## Quick Start
//!
//! ```no_run
//! use cardlink::{CardSession, TcpTransport};
//!
//! #[tokio::main]
//! async fn main() -> cardlink::Result<()> {
//!     // Connect through a serial-over-TCP bridge
//!     let mut session = CardSession::new(TcpTransport::new("192.168.1.80", 9100));
//!     session.connect().await?;
//!
//!     // List the card's root directory
//!     let listing = session.list("/").await?;
//!     println!("{}", String::from_utf8_lossy(&listing.body_bytes()));
//!
//!     session.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod card;
pub mod config;
pub mod error;
pub mod mux;

// Re-exports
pub use card::{AbortHandle, CardSession};
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use mux::Multiplexer;

// Re-export types
pub use cardlink_core::{Command, ConnectionState, Monitor, Packet};
pub use cardlink_transport::{StreamTransport, TcpTransport, Transport};
pub use cardlink_types::{Response, ResponseBody, Status};
