//! Card command responses
//!
//! A [`Response`] captures what the card said at the conclusion of one
//! command: the numeric status, the message text, and wherever the bulk body
//! ended up (nowhere, in memory, or in a local file).

use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use tracing::error;

use crate::error::{Error, Result};
use crate::status::Status;

/// Location of the bulk data attached to a response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResponseBody {
    /// The command carried no data transfer
    #[default]
    None,

    /// Body buffered in memory (small transfers)
    Bytes(Bytes),

    /// Body streamed to a local file (large transfers)
    File(PathBuf),
}

/// Outcome of one card command.
///
/// Immutable once constructed. Produced by the session from the reply line
/// received on the command channel; card-reported failures travel here as
/// ordinary values, never as errors.
///
/// # Examples
///
/// ```
/// use cardlink_types::{Response, Status};
///
/// let response = Response::parse(b"226 Transfer complete").unwrap();
/// assert_eq!(response.code(), 226);
/// assert_eq!(response.status(), Status::TransferComplete);
/// assert_eq!(response.message(), "Transfer complete");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    code: u16,
    message: String,
    body: ResponseBody,
}

impl Response {
    /// Create a response with the given status code and message
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            body: ResponseBody::None,
        }
    }

    /// The fixed response representing a deliberately terminated operation
    pub fn abort() -> Self {
        Self::new(426, "Aborted.")
    }

    /// Parse a reply line (`"<status> <message>"`, terminator already
    /// stripped) received on the command channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedStatusLine`] when the first token is not a
    /// numeric status code. The session treats that as a protocol failure.
    pub fn parse(line: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(line);
        let mut split = text.splitn(2, char::is_whitespace);

        let token = split.next().unwrap_or("");
        let code: u16 = token.parse().map_err(|_| {
            error!("Unparseable reply line: {:?}", text);
            Error::MalformedStatusLine(text.to_string())
        })?;

        Ok(Self {
            code,
            message: split.next().unwrap_or("").to_string(),
            body: ResponseBody::None,
        })
    }

    /// Attach a body to this response
    pub fn with_body(mut self, body: ResponseBody) -> Self {
        self.body = body;
        self
    }

    /// Raw numeric status code
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Semantic status for the code
    pub fn status(&self) -> Status {
        Status::from_code(self.code)
    }

    /// Message text that followed the status code
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Space-separated code and message, as the card sent it
    pub fn status_message(&self) -> String {
        format!("{} {}", self.code, self.message)
    }

    /// Body location for this response
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Read the body into memory. DO NOT use for large transfers.
    ///
    /// Returns empty bytes when there is no body or the body file cannot be
    /// read.
    pub fn body_bytes(&self) -> Bytes {
        match &self.body {
            ResponseBody::None => Bytes::new(),
            ResponseBody::Bytes(bytes) => bytes.clone(),
            ResponseBody::File(path) => match std::fs::read(path) {
                Ok(data) => Bytes::from(data),
                Err(e) => {
                    error!("Error reading response body file {:?}: {}", path, e);
                    Bytes::new()
                }
            },
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Response[{} {}]", self.code, self.message)
    }
}
