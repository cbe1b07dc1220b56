//! High-level error types
//!
//! Only genuine transport and protocol failures surface here. Everything
//! the card itself reports (aborted, unauthorized, not found) travels as an
//! ordinary [`cardlink_types::Response`], never as an error.

use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] cardlink_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] cardlink_transport::Error),

    /// The card sent a reply line that does not start with a numeric status
    #[error("Protocol error: {0}")]
    Protocol(#[from] cardlink_types::Error),

    /// Operation attempted without an active connection. A local usage
    /// error, not a transport failure.
    #[error("Card not connected")]
    NotConnected,

    /// In-flight operation deliberately terminated.
    ///
    /// Never escapes a session operation; the session converts it into the
    /// 426 abort response.
    #[error("Operation aborted")]
    Aborted,

    /// The reader task is gone and the channel queues are drained
    #[error("Link closed")]
    LinkClosed,

    #[error("Timed out waiting for card reply after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
