//! XML document model, input decoding, parser and writer

pub mod encoding;
pub mod model;
pub mod parser;
pub mod writer;

pub use model::{Content, Document, Element};
pub use parser::{Config, Parser};
pub use writer::{to_bytes, to_string, DECLARATION};
