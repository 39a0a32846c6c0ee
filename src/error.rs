//! Per-request error types
//!
//! Each variant maps to exactly one terminal HTTP status.

use std::io;
use thiserror::Error;

/// Request path could not be percent-decoded (400)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// `%` not followed by two hex digits
    #[error("malformed percent escape at byte {0}")]
    MalformedEscape(usize),

    /// Escapes decode to bytes that are not UTF-8
    #[error("percent escapes do not decode to UTF-8")]
    InvalidUtf8,
}

/// Path resolution failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("bad request path: {0}")]
    Decode(#[from] DecodeError),

    /// Resolved location is outside the serve root (403)
    #[error("path escapes serve root")]
    Forbidden,
}

/// File read failures
#[derive(Debug, Error)]
pub enum ServeError {
    /// 404
    #[error("file not found")]
    NotFound,

    /// Any other I/O failure (500)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ServeError {
    pub fn from_read(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Io(err)
        }
    }

    pub const fn status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Io(_) => 500,
        }
    }
}

impl ResolveError {
    pub const fn status(&self) -> u16 {
        match self {
            Self::Decode(_) => 400,
            Self::Forbidden => 403,
        }
    }
}
