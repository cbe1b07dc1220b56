//! Card status codes
//!
//! The card replies to every command with an FTP-style numeric status. The
//! codes are the interface: higher layers branch on the number, never on the
//! human-readable message that follows it.

use std::fmt;

/// Semantic meaning of a card status code.
///
/// Any code the card is not known to send maps to [`Status::Unknown`].
///
/// # Examples
///
/// ```
/// use cardlink_types::Status;
///
/// assert_eq!(Status::from_code(226), Status::TransferComplete);
/// assert_eq!(Status::from_code(999), Status::Unknown(999));
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    /// 150 - data transfer about to begin
    DataTransferStarting,

    /// 213 - auxiliary success (finalize/commit)
    AuxiliarySuccess,

    /// 226 - transfer complete
    TransferComplete,

    /// 230 - authenticated / signed in
    SignedIn,

    /// 231 - signed out
    SignedOut,

    /// 250 - file action success (delete, remove directory)
    FileActionSuccess,

    /// 257 - directory created
    DirectoryCreated,

    /// 350 - rename accepted, awaiting destination path
    AwaitingRename,

    /// 426 - operation aborted
    Aborted,

    /// 430 - sign-in failure
    SignInFailure,

    /// 501 - bad or invalid data
    InvalidData,

    /// 530 - unauthorized
    Unauthorized,

    /// 550 - not found
    NotFound,

    /// Any code without a known meaning
    Unknown(u16),
}

impl Status {
    /// Map a raw status code to its semantic value
    pub fn from_code(code: u16) -> Self {
        match code {
            150 => Self::DataTransferStarting,
            213 => Self::AuxiliarySuccess,
            226 => Self::TransferComplete,
            230 => Self::SignedIn,
            231 => Self::SignedOut,
            250 => Self::FileActionSuccess,
            257 => Self::DirectoryCreated,
            350 => Self::AwaitingRename,
            426 => Self::Aborted,
            430 => Self::SignInFailure,
            501 => Self::InvalidData,
            530 => Self::Unauthorized,
            550 => Self::NotFound,
            other => Self::Unknown(other),
        }
    }

    /// Raw numeric code for this status
    pub fn code(&self) -> u16 {
        match self {
            Self::DataTransferStarting => 150,
            Self::AuxiliarySuccess => 213,
            Self::TransferComplete => 226,
            Self::SignedIn => 230,
            Self::SignedOut => 231,
            Self::FileActionSuccess => 250,
            Self::DirectoryCreated => 257,
            Self::AwaitingRename => 350,
            Self::Aborted => 426,
            Self::SignInFailure => 430,
            Self::InvalidData => 501,
            Self::Unauthorized => 530,
            Self::NotFound => 550,
            Self::Unknown(code) => *code,
        }
    }

    /// Check if this status reports a completed, successful action
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::AuxiliarySuccess
                | Self::TransferComplete
                | Self::SignedIn
                | Self::SignedOut
                | Self::FileActionSuccess
                | Self::DirectoryCreated
        )
    }

    /// Check if this status is an error reported by the card itself
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Aborted
                | Self::SignInFailure
                | Self::InvalidData
                | Self::Unauthorized
                | Self::NotFound
        )
    }
}

impl From<u16> for Status {
    fn from(code: u16) -> Self {
        Self::from_code(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "Unknown({code})"),
            other => write!(f, "{} {:?}", other.code(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_table() {
        let table = [
            (150, Status::DataTransferStarting),
            (213, Status::AuxiliarySuccess),
            (226, Status::TransferComplete),
            (230, Status::SignedIn),
            (231, Status::SignedOut),
            (250, Status::FileActionSuccess),
            (257, Status::DirectoryCreated),
            (350, Status::AwaitingRename),
            (426, Status::Aborted),
            (430, Status::SignInFailure),
            (501, Status::InvalidData),
            (530, Status::Unauthorized),
            (550, Status::NotFound),
        ];

        for (code, expected) in table {
            assert_eq!(Status::from_code(code), expected);
            assert_eq!(expected.code(), code);
        }
    }

    #[test]
    fn test_unlisted_codes_are_unknown() {
        for code in [0, 100, 200, 221, 500, 551, 999] {
            assert_eq!(Status::from_code(code), Status::Unknown(code));
        }
    }

    #[test]
    fn test_success_and_error_are_disjoint() {
        for code in 0..1000 {
            let status = Status::from_code(code);
            assert!(!(status.is_success() && status.is_error()));
        }
    }
}
