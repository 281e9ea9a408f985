//! Error types for pathprune

use std::fmt;
use thiserror::Error;

/// Position in a source document
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Range in a source document
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self::new(pos, pos)
    }

    pub const fn empty() -> Self {
        Self::at(Pos::new(0, 0, 0))
    }

    const fn is_empty(&self) -> bool {
        self.start.line == 0 && self.end.line == 0
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidToken,
    UnexpectedEof,
    MismatchedTag { expected: String, found: String },
    DuplicateAttribute { name: String },
    InvalidEntity { entity: String },
    InvalidUtf8,
    UnsupportedEncoding { encoding: String },
    InvalidEncoding { encoding: String },
    MissingRoot,
    InvalidJson,
    MaxDepthExceeded { max: u16 },
    UnsupportedFormat { extension: String },
    InvalidFilter,
    InvalidPattern { pattern: String },
    Serialize,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken => write!(f, "invalid token"),
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::MismatchedTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{expected}>, found </{found}>")
            }
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute: {name}"),
            Self::InvalidEntity { entity } => write!(f, "invalid entity: &{entity};"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::UnsupportedEncoding { encoding } => write!(f, "unsupported encoding: {encoding}"),
            Self::InvalidEncoding { encoding } => write!(f, "input is not valid {encoding}"),
            Self::MissingRoot => write!(f, "document has no root element"),
            Self::InvalidJson => write!(f, "invalid json"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::UnsupportedFormat { extension } => {
                write!(f, "unsupported file type: {extension:?}")
            }
            Self::InvalidFilter => write!(f, "invalid filter configuration"),
            Self::InvalidPattern { pattern } => write!(f, "invalid wildcard pattern: {pattern}"),
            Self::Serialize => write!(f, "serialization failed"),
            Self::Io => write!(f, "i/o error"),
        }
    }
}

/// Main error type for pathprune
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Error without a source position
    pub fn bare(kind: ErrorKind) -> Self {
        Self::new(kind, Span::empty())
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        Self::new(kind, Span::at(pos))
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the input document could not be parsed at all
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InvalidToken
                | ErrorKind::UnexpectedEof
                | ErrorKind::MismatchedTag { .. }
                | ErrorKind::DuplicateAttribute { .. }
                | ErrorKind::InvalidEntity { .. }
                | ErrorKind::InvalidUtf8
                | ErrorKind::UnsupportedEncoding { .. }
                | ErrorKind::InvalidEncoding { .. }
                | ErrorKind::MissingRoot
                | ErrorKind::InvalidJson
                | ErrorKind::MaxDepthExceeded { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "error at {}: {}", self.span.start, self.message)
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::with_message(ErrorKind::Io, Span::empty(), err.to_string())
    }
}

/// Result type alias for pathprune
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_display() {
        let pos = Pos::new(42, 10, 5);
        assert_eq!(pos.to_string(), "10:5");
    }

    #[test]
    fn test_error_display_with_position() {
        let err = Error::at(ErrorKind::UnexpectedEof, Pos::new(10, 2, 5));
        let display = err.to_string();
        assert!(display.contains("error at 2:5"));
        assert!(display.contains("unexpected end of input"));
    }

    #[test]
    fn test_error_display_without_position() {
        let err = Error::bare(ErrorKind::UnsupportedFormat {
            extension: "csv".to_string(),
        });
        assert_eq!(err.to_string(), "unsupported file type: \"csv\"");
    }

    #[test]
    fn test_parse_failure_classification() {
        assert!(Error::bare(ErrorKind::InvalidJson).is_parse_failure());
        assert!(Error::bare(ErrorKind::MissingRoot).is_parse_failure());
        assert!(!Error::bare(ErrorKind::InvalidFilter).is_parse_failure());
        assert!(!Error::bare(ErrorKind::InvalidPattern {
            pattern: "[".to_string()
        })
        .is_parse_failure());
    }
}
