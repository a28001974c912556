//! Error classification for retries.

use std::fmt;
use std::io;

// == Error Kind ==
/// Closed set of failure categories the retry loop understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network failure, timeout or abort. The only retryable kind.
    Transient,
    /// Missing or rejected credentials.
    Unauthorized,
    /// The request itself is malformed; repeating it cannot help.
    InvalidInput,
    /// Anything else. Treated as fatal so programming errors surface immediately.
    Unknown,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Transient => "transient",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

// == Classify Trait ==
/// Maps a typed error to its [`ErrorKind`].
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

impl Classify for ErrorKind {
    fn kind(&self) -> ErrorKind {
        *self
    }
}

impl Classify for io::Error {
    fn kind(&self) -> ErrorKind {
        match io::Error::kind(self) {
            io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::UnexpectedEof => ErrorKind::Transient,
            io::ErrorKind::PermissionDenied => ErrorKind::Unauthorized,
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => ErrorKind::InvalidInput,
            _ => ErrorKind::Unknown,
        }
    }
}

const UNAUTHORIZED_MARKERS: &[&str] = &[
    "invalid login credentials",
    "email not confirmed",
    "jwt",
    "unauthorized",
    "not authorized",
    "invalid api key",
];

const INVALID_INPUT_MARKERS: &[&str] = &[
    "invalid input",
    "malformed",
    "invalid syntax",
    "violates",
    "bad request",
];

const TRANSIENT_MARKERS: &[&str] = &[
    "network",
    "timeout",
    "timed out",
    "fetch failed",
    "failed to fetch",
    "connection",
    "econnreset",
    "abort",
];

/// Classifies an untyped backend error by its message.
///
/// Fatal markers win over transient ones, so "connection rejected: invalid
/// login credentials" is not retried. Matching is case-insensitive.
pub fn classify_message(message: &str) -> ErrorKind {
    let message = message.to_lowercase();
    let contains_any = |markers: &[&str]| markers.iter().any(|m| message.contains(m));

    if contains_any(UNAUTHORIZED_MARKERS) {
        ErrorKind::Unauthorized
    } else if contains_any(INVALID_INPUT_MARKERS) {
        ErrorKind::InvalidInput
    } else if contains_any(TRANSIENT_MARKERS) {
        ErrorKind::Transient
    } else {
        ErrorKind::Unknown
    }
}
