//! Stream transport
//!
//! Wraps a serial link some other layer already established. Platform
//! integrations hand over the byte stream of a connected Bluetooth-SPP
//! socket or USB serial port; tests hand over one end of
//! `tokio::io::duplex`.

use async_trait::async_trait;
use tracing::debug;

use crate::{error::*, BoxedLink, Link, Transport};

/// Transport over a pre-established serial link
///
/// # Examples
///
/// ```
/// use cardlink_transport::{StreamTransport, Transport};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> cardlink_transport::Result<()> {
/// let (local, _remote) = tokio::io::duplex(1024);
/// let mut transport = StreamTransport::new(local).with_peer("test card");
/// let link = transport.open().await?;
/// # drop(link);
/// # Ok(())
/// # }
/// ```
pub struct StreamTransport {
    link: Option<BoxedLink>,
    peer: String,
}

impl StreamTransport {
    /// Wrap an established link
    pub fn new(link: impl Link + 'static) -> Self {
        Self {
            link: Some(Box::new(link)),
            peer: "serial link".to_string(),
        }
    }

    /// Name the peer for logs and errors
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = peer.into();
        self
    }
}

#[async_trait]
impl Transport for StreamTransport {
    async fn open(&mut self) -> Result<BoxedLink> {
        debug!("Handing out link to {}", self.peer);

        // The link exists only once; reconnecting means the platform layer
        // establishes a new one and builds a new transport around it.
        self.link.take().ok_or(Error::LinkTaken)
    }

    fn peer(&self) -> String {
        self.peer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_hands_out_link_once() {
        let (local, _remote) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new(local);

        assert!(transport.open().await.is_ok());
        assert!(matches!(transport.open().await, Err(Error::LinkTaken)));
    }

    #[tokio::test]
    async fn test_peer_name() {
        let (local, _remote) = tokio::io::duplex(64);
        let transport = StreamTransport::new(local).with_peer("CYBERGATE-01");
        assert_eq!(transport.peer(), "CYBERGATE-01");
    }
}
