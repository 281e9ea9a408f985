//! JSON parsing and serialization

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, ErrorKind, Pos, Result, Span};

/// Parse a JSON document, keeping object keys in source order
pub fn parse(bytes: &[u8]) -> Result<Value> {
    let value: Value = serde_json::from_slice(bytes).map_err(|err| {
        let line = u32::try_from(err.line()).unwrap_or(u32::MAX);
        let col = u32::try_from(err.column()).unwrap_or(u32::MAX);
        Error::with_message(
            ErrorKind::InvalidJson,
            Span::at(Pos::new(0, line, col)),
            err.to_string(),
        )
    })?;
    debug!(bytes = bytes.len(), "parsed json document");
    Ok(value)
}

/// Serialize with two-space indentation
pub fn to_bytes(value: &Value) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value)
        .map_err(|err| Error::with_message(ErrorKind::Serialize, Span::empty(), err.to_string()))
}
