//! Transport layer for the card protocol
//!
//! A transport knows how to open a raw, unreliable, byte-oriented serial
//! link to the card and nothing else; framing and channel separation live
//! above it. Bluetooth-SPP and USB-serial links established by platform
//! integrations plug in through [`StreamTransport`]; [`TcpTransport`] dials
//! serial-over-TCP bridges and protocol emulators.

pub mod error;
pub mod io;
pub mod tcp;

pub use error::{Error, Result};
pub use io::StreamTransport;
pub use tcp::TcpTransport;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// A raw duplex byte stream to the card.
///
/// Closing the link means dropping it (after shutting down the write half),
/// which unblocks any pending read.
pub trait Link: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Link for T {}

/// Boxed [`Link`] trait object, what a transport hands to the session
pub type BoxedLink = Box<dyn Link>;

/// Transport trait for the different ways of reaching a card
#[async_trait]
pub trait Transport: Send {
    /// Open the serial link and hand the raw byte stream to the caller.
    ///
    /// The caller owns the link from here on; the transport keeps only
    /// whatever it needs to open another one.
    ///
    /// # Errors
    ///
    /// [`Error::Unavailable`] when the underlying adapter is off,
    /// [`Error::NotPaired`] when the card is unknown to the host, and the
    /// usual I/O failures otherwise.
    async fn open(&mut self) -> Result<BoxedLink>;

    /// Human-readable identity of the peer
    fn peer(&self) -> String;
}
