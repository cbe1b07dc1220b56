//! Transport errors

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The adapter behind this transport is unavailable (Bluetooth off,
    /// USB permission missing)
    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    /// The card is not paired with or known to this host
    #[error("Card not paired: {0}")]
    NotPaired(String),

    #[error("Connection timeout")]
    ConnectionTimeout,

    /// A pre-established link can only be handed out once
    #[error("Link already taken")]
    LinkTaken,

    #[error("Connection closed by remote")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}
