//! Protocol constants

use std::time::Duration;

/// Carriage return, first byte of the reply-line terminator
pub const CARRIAGE_RETURN: u8 = 13;

/// Line feed, second byte of the reply-line terminator
pub const LINE_FEED: u8 = 10;

/// Pause between data-channel packets during a chunked upload.
///
/// The card's serial receiver is slow; pacing the sender keeps it from
/// overrunning.
pub const UPLOAD_DELAY: Duration = Duration::from_millis(1);

/// Chunks between transfer-progress log lines during bulk moves
pub const TRANSFER_LOG_INTERVAL: u64 = 50;
