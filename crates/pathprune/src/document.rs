//! Parsed documents of either supported format

use crate::error::Result;
use crate::format::Format;
use crate::json;
use crate::xml;

/// A parsed XML or JSON document
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    Xml(xml::Document),
    Json(serde_json::Value),
}

impl Document {
    /// Parse raw bytes in the given format
    pub fn parse(bytes: &[u8], format: Format) -> Result<Self> {
        match format {
            Format::Xml => xml::Parser::new(bytes).parse().map(Self::Xml),
            Format::Json => json::parse(bytes).map(Self::Json),
        }
    }

    /// Format this document was parsed from
    pub const fn format(&self) -> Format {
        match self {
            Self::Xml(_) => Format::Xml,
            Self::Json(_) => Format::Json,
        }
    }

    /// Serialize in the document's own format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::Xml(doc) => Ok(xml::to_bytes(doc)),
            Self::Json(value) => json::to_bytes(value),
        }
    }

    pub fn as_xml(&self) -> Option<&xml::Document> {
        match self {
            Self::Xml(doc) => Some(doc),
            Self::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Xml(_) => None,
        }
    }
}

impl From<xml::Document> for Document {
    fn from(doc: xml::Document) -> Self {
        Self::Xml(doc)
    }
}

impl From<serde_json::Value> for Document {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}
