//! Error types for cardlink-core

/// Result type alias for core protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Payload cannot be framed: the 16-bit length field would overflow
    #[error("Payload too large to frame: {size} bytes (length field limit: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },

    /// I/O error while reading a packet off the wire.
    ///
    /// A stream that closes mid-packet surfaces here as `UnexpectedEof`;
    /// no partial-packet recovery is attempted.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
