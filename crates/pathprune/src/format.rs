//! Document format selection

use std::fmt;
use std::path::Path;

use crate::error::{Error, ErrorKind, Result};

/// Supported document formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Xml,
    Json,
}

impl Format {
    /// File extension without the leading dot
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Json => "json",
        }
    }

    /// Format for a bare extension, case-insensitive
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xml" => Some(Self::Xml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Format for a file name, or `UnsupportedFormat`
    pub fn for_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| {
            Error::bare(ErrorKind::UnsupportedFormat {
                extension: ext.to_string(),
            })
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Detect format from a path's extension
pub fn detect_format_from_path(path: impl AsRef<Path>) -> Option<Format> {
    Format::for_path(path).ok()
}
