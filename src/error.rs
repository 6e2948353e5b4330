use thiserror::Error;

/// Errors raised by the FTP core.
///
/// Command-level variants map onto a single control-channel response via
/// [`FtpError::to_ftp_response`]; I/O variants carry the platform error so its
/// string form can be surfaced in reply text.
#[derive(Error, Debug)]
pub enum FtpError {
    #[error("path contains a parent segment: {0}")]
    PathTraversal(String),

    #[error("path contains a doubled separator: {0}")]
    DoubledSeparator(String),

    #[error("path exceeds {0} bytes")]
    PathTooLong(usize),

    #[error("command line exceeds buffer capacity")]
    CommandOverflow,

    #[error("listing line exceeds transfer buffer capacity")]
    ListingOverflow,

    #[error("bad sequence of commands")]
    BadSequence,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FtpError {
    /// Maps the error onto the FTP response line a handler should send.
    pub fn to_ftp_response(&self) -> String {
        match self {
            FtpError::PathTraversal(_) | FtpError::DoubledSeparator(_) => {
                format!("553 {}\r\n", self)
            }
            FtpError::PathTooLong(_) => format!("553 {}\r\n", self),
            FtpError::CommandOverflow => "500 Command line too long.\r\n".to_string(),
            FtpError::ListingOverflow => "451 Listing line too long.\r\n".to_string(),
            FtpError::BadSequence => "503 Bad sequence of commands.\r\n".to_string(),
            FtpError::Io(e) => format!("550 {}.\r\n", e),
        }
    }
}
