//! pathprune - path-based pruning of XML and JSON documents
//!
//! # Quick Start
//!
//! ```
//! use pathprune::{enumerate_paths, measure, prune, Document, Format, PathSet};
//! # fn main() -> Result<(), pathprune::Error> {
//! let doc = Document::parse(b"<root><a>1</a><b>2</b></root>", Format::Xml)?;
//! assert!(enumerate_paths(&doc).contains("root/b"));
//!
//! let excluded: PathSet = ["root/b".to_string()].into_iter().collect();
//! let pruned = prune(&doc, &excluded);
//! assert!(measure(&pruned)? < measure(&doc)?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod cursor;
pub mod format;
pub use format::{detect_format_from_path, Format};

pub mod json;
pub mod xml;
pub use xml::{Content as XmlContent, Document as XmlDocument, Element as XmlElement};

pub mod document;
pub use document::Document;

pub mod path;
pub use path::{enumerate_paths, path_stats, PathSet, PathStats};

pub mod prune;
pub use prune::{measure, measure_pruned, prune};

pub mod hierarchy;
pub use hierarchy::hierarchy;

pub mod filter;
pub use filter::{expand_wildcards, parse_wildcards, FilterConfig, Selection};

pub mod session;
pub use session::{Session, SizeReport};

pub mod export;
pub use export::Export;

/// Parse XML from string
pub fn from_xml_str(s: &str) -> Result<Document> {
    Document::parse(s.as_bytes(), Format::Xml)
}

/// Parse JSON from string
pub fn from_json_str(s: &str) -> Result<Document> {
    Document::parse(s.as_bytes(), Format::Json)
}

/// Parse a file's bytes, choosing the format from its name
pub fn from_named_bytes(name: &str, bytes: &[u8]) -> Result<Document> {
    Document::parse(bytes, Format::for_path(name)?)
}
