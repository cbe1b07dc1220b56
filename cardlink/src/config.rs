//! Session configuration

use std::time::Duration;

use cardlink_core::constants::UPLOAD_DELAY;

/// Tunables for a card session
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use cardlink::SessionConfig;
///
/// let config = SessionConfig::default()
///     .with_reply_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on waiting for a command-channel reply line.
    ///
    /// `None` waits indefinitely, which matches card behavior in the field:
    /// a busy card can legitimately take a long time to answer. Set a bound
    /// when a stalled card must not hang the caller forever.
    pub reply_timeout: Option<Duration>,

    /// Pause between data-channel packets during a chunked upload
    pub upload_delay: Duration,
}

impl SessionConfig {
    /// Bound command-channel reply waits
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = Some(timeout);
        self
    }

    /// Set the pacing delay between upload chunks
    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reply_timeout: None,
            upload_delay: UPLOAD_DELAY,
        }
    }
}
