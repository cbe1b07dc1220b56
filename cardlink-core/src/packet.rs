//! Wire packet framing and channel encoding/decoding

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result};

/// One framed unit on the serial wire
///
/// # Packet Structure
///
/// ```text
/// ┌─────────────┬─────────────────┬─────────────┬─────────────┐
/// │   Channel   │  Packet Length  │   Payload   │  Checksum   │
/// │   1 byte    │    2 bytes      │   N bytes   │   2 bytes   │
/// │             │  (BE u16, N+5)  │   (bytes)   │ (reserved)  │
/// └─────────────┴─────────────────┴─────────────┴─────────────┘
/// ```
///
/// The length field counts the whole packet, payload plus five bytes of
/// framing. The checksum field is reserved: the card neither computes nor
/// verifies it, so both bytes are written as zero on encode and discarded
/// on decode. Integrity beyond the transport is not provided.
///
/// # Examples
///
/// ```
/// use cardlink_core::{Packet, COMMAND_CHANNEL};
///
/// let packet = Packet::new(COMMAND_CHANNEL, &b"226 OK\r\n"[..]);
/// let encoded = packet.encode().unwrap();
/// assert_eq!(encoded.len(), packet.payload.len() + Packet::OVERHEAD);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    /// Logical channel this packet belongs to
    pub channel: u8,

    /// Packet payload
    pub payload: Bytes,
}

impl Packet {
    /// Packet header size in bytes (channel + length field)
    pub const HEADER_SIZE: usize = 3;

    /// Reserved checksum trailer size in bytes
    pub const CHECKSUM_SIZE: usize = 2;

    /// Total framing overhead per packet
    pub const OVERHEAD: usize = Self::HEADER_SIZE + Self::CHECKSUM_SIZE;

    /// Largest payload the 16-bit length field can describe
    pub const MAX_FRAMEABLE_PAYLOAD: usize = u16::MAX as usize - Self::OVERHEAD;

    /// Create a packet for the given channel
    ///
    /// # Examples
    ///
    /// ```
    /// use cardlink_core::{Packet, DATA_CHANNEL};
    ///
    /// let packet = Packet::new(DATA_CHANNEL, vec![1, 2, 3]);
    /// assert_eq!(packet.payload.len(), 3);
    /// ```
    pub fn new(channel: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            channel,
            payload: payload.into(),
        }
    }

    /// Encode packet to wire bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] when the payload cannot be
    /// described by the 16-bit length field. Senders conventionally cap
    /// payloads at [`crate::MAX_PAYLOAD_SIZE`], far below this limit.
    pub fn encode(&self) -> Result<BytesMut> {
        let total_size = self.payload.len() + Self::OVERHEAD;
        if total_size > u16::MAX as usize {
            return Err(Error::PayloadTooLarge {
                size: self.payload.len(),
                max: Self::MAX_FRAMEABLE_PAYLOAD,
            });
        }

        let mut buf = BytesMut::with_capacity(total_size);

        // Header (length is big-endian, network byte order)
        buf.put_u8(self.channel);
        buf.put_u16(total_size as u16);

        buf.put_slice(&self.payload);

        // Reserved checksum bytes, always zero
        buf.put_u16(0x0000);

        Ok(buf)
    }

    /// Read one packet off the wire
    ///
    /// Reads exactly one header, the payload the length field describes and
    /// the two reserved checksum bytes.
    ///
    /// # Errors
    ///
    /// A stream that ends mid-packet fails with the underlying
    /// `UnexpectedEof`; a length field below the framing overhead fails with
    /// `InvalidData`. Both are fatal to the connection.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; Self::HEADER_SIZE];
        reader.read_exact(&mut header).await?;

        let channel = header[0];
        let packet_size = u16::from_be_bytes([header[1], header[2]]) as usize;

        let payload_size = packet_size.checked_sub(Self::OVERHEAD).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Packet length field below framing minimum: {packet_size}"),
            )
        })?;

        let mut payload = vec![0u8; payload_size];
        reader.read_exact(&mut payload).await?;

        // Reserved checksum trailer, read and discarded
        let mut checksum = [0u8; Self::CHECKSUM_SIZE];
        reader.read_exact(&mut checksum).await?;

        Ok(Self {
            channel,
            payload: Bytes::from(payload),
        })
    }

    /// Total encoded packet size
    pub fn size(&self) -> usize {
        self.payload.len() + Self::OVERHEAD
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("channel", &self.channel)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Packet[ch={}](len={})", self.channel, self.payload.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{COMMAND_CHANNEL, DATA_CHANNEL, MAX_PAYLOAD_SIZE};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    async fn decode(bytes: &[u8]) -> Result<Packet> {
        let mut reader = bytes;
        Packet::read_from(&mut reader).await
    }

    #[test]
    fn test_encode_layout() {
        let packet = Packet::new(COMMAND_CHANNEL, &b"abc"[..]);
        let encoded = packet.encode().unwrap();

        assert_eq!(&encoded[..], &[1, 0, 8, b'a', b'b', b'c', 0, 0]);
    }

    #[test]
    fn test_encode_length_field() {
        let packet = Packet::new(DATA_CHANNEL, vec![0xAB; 300]);
        let encoded = packet.encode().unwrap();

        let length = u16::from_be_bytes([encoded[1], encoded[2]]) as usize;
        assert_eq!(length, 300 + Packet::OVERHEAD);
    }

    #[test]
    fn test_encode_empty_payload() {
        let packet = Packet::new(COMMAND_CHANNEL, Bytes::new());
        let encoded = packet.encode().unwrap();

        assert_eq!(encoded.len(), Packet::OVERHEAD);
        assert_eq!(&encoded[..], &[1, 0, 5, 0, 0]);
    }

    #[test]
    fn test_encode_payload_too_large() {
        let packet = Packet::new(DATA_CHANNEL, vec![0; u16::MAX as usize]);
        let result = packet.encode();

        assert!(matches!(result, Err(Error::PayloadTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_decode_round_trip() {
        let original = Packet::new(DATA_CHANNEL, vec![1, 2, 3, 4, 5]);
        let encoded = original.encode().unwrap();

        let decoded = decode(&encoded).await.unwrap();
        assert_eq!(decoded.channel, original.channel);
        assert_eq!(decoded.payload, original.payload);
    }

    #[tokio::test]
    async fn test_decode_discards_checksum() {
        // Same packet with a nonzero checksum trailer decodes identically
        let mut encoded = Packet::new(COMMAND_CHANNEL, &b"150 Opening"[..])
            .encode()
            .unwrap();
        let len = encoded.len();
        encoded[len - 2] = 0xDE;
        encoded[len - 1] = 0xAD;

        let decoded = decode(&encoded).await.unwrap();
        assert_eq!(decoded.payload, Bytes::from_static(b"150 Opening"));
    }

    #[tokio::test]
    async fn test_decode_short_read_is_fatal() {
        let encoded = Packet::new(DATA_CHANNEL, vec![0xAB; 64]).encode().unwrap();

        // Stream closes mid-payload
        let result = decode(&encoded[..20]).await;
        match result {
            Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("Expected UnexpectedEof, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_decode_truncated_header() {
        let result = decode(&[1, 0]).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_decode_undersized_length_field() {
        // Length field claims fewer bytes than the framing overhead
        let result = decode(&[1, 0, 3, 0, 0]).await;
        match result {
            Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::InvalidData),
            other => panic!("Expected InvalidData, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            payload in proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_SIZE),
            channel in 1u8..=2,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();

            let original = Packet::new(channel, payload);
            let encoded = original.encode().unwrap();

            prop_assert_eq!(
                u16::from_be_bytes([encoded[1], encoded[2]]) as usize,
                original.payload.len() + Packet::OVERHEAD
            );

            let decoded = rt.block_on(decode(&encoded)).unwrap();
            prop_assert_eq!(decoded.channel, original.channel);
            prop_assert_eq!(decoded.payload, original.payload);
        }
    }
}
