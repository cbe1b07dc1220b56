//! Card protocol command definitions
//!
//! The card speaks an FTP-like command set: one ASCII verb plus one argument
//! per line, CRLF terminated, sent on the command channel.

use std::fmt;

use bytes::Bytes;
use chrono::Local;

/// Protocol command verbs
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// List directory contents
    List,

    /// Retrieve a file
    Retr,

    /// Store a file
    Stor,

    /// Delete a file
    Dele,

    /// Make a directory
    Mkd,

    /// Remove a directory
    Rmd,

    /// Set file time and commit an uploaded file
    Srft,

    /// Rename: source path
    Rnfr,

    /// Rename: destination path
    Rnto,
}

impl Command {
    /// Wire verb for this command
    pub fn verb(&self) -> &'static str {
        match self {
            Self::List => "LIST",
            Self::Retr => "RETR",
            Self::Stor => "STOR",
            Self::Dele => "DELE",
            Self::Mkd => "MKD",
            Self::Rmd => "RMD",
            Self::Srft => "SRFT",
            Self::Rnfr => "RNFR",
            Self::Rnto => "RNTO",
        }
    }

    /// Build the command line sent on the command channel
    ///
    /// # Examples
    ///
    /// ```
    /// use cardlink_core::Command;
    ///
    /// let line = Command::Retr.line("/data/x.txt");
    /// assert_eq!(&line[..], b"RETR /data/x.txt\r\n");
    /// ```
    pub fn line(&self, argument: &str) -> Bytes {
        Bytes::from(format!("{} {}\r\n", self.verb(), argument))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Append the glob suffix the card firmware expects on `LIST` paths
///
/// # Examples
///
/// ```
/// use cardlink_core::command::glob_path;
///
/// assert_eq!(glob_path("/"), "/*");
/// assert_eq!(glob_path("/data"), "/data/*");
/// ```
pub fn glob_path(path: &str) -> String {
    if path == "/" {
        format!("{path}*")
    } else {
        format!("{path}/*")
    }
}

/// Build the `SRFT` argument: a local-clock timestamp followed by the path.
///
/// The timestamp hour field is a 12-hour clock; that is the format the card
/// firmware accepts.
pub fn finalize_argument(path: &str) -> String {
    let timestamp = Local::now().format("%Y%m%d%I%M%S");
    format!("{timestamp} {path}")
}
