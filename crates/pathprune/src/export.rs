//! Optimized document export with an audit log

use std::fs;
use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::OffsetDateTime;
use tracing::info;

use crate::error::{Error, ErrorKind, Result, Span};
use crate::filter::Selection;
use crate::session::Session;

/// Pruned document ready to be written out
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub log_name: String,
    pub log: String,
}

impl Export {
    /// Prune the session's document and describe the selection
    pub fn build(session: &Session, at: OffsetDateTime) -> Result<Self> {
        let stamp = at
            .format(format_description!("[year][month][day]_[hour][minute][second]"))
            .map_err(format_error)?;
        let base = format!("{}_optimized_{stamp}", session.source_stem());

        let bytes = session.pruned().to_bytes()?;
        let log = audit_log(session.source_name(), &session.selection(), at)?;

        Ok(Self {
            file_name: format!("{base}.{}", session.format().extension()),
            bytes,
            log_name: format!("{base}.log"),
            log,
        })
    }

    /// Write the document and, if `with_log`, the audit log into `dir`
    pub fn write_to(&self, dir: impl AsRef<Path>, with_log: bool) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut written = Vec::with_capacity(2);

        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        written.push(path);

        if with_log {
            let path = dir.join(&self.log_name);
            fs::write(&path, &self.log)?;
            written.push(path);
        }

        info!(dir = %dir.display(), files = written.len(), "export written");
        Ok(written)
    }
}

/// Plain-text record of which paths were kept and dropped
pub fn audit_log(source_name: &str, selection: &Selection, at: OffsetDateTime) -> Result<String> {
    let stamp = at
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .map_err(format_error)?;

    let mut lines = vec![
        format!("Source file: {source_name}"),
        format!("Export timestamp: {stamp}"),
        String::new(),
        "Included paths:".to_string(),
    ];
    lines.extend(selection.included.iter().cloned());
    lines.push(String::new());
    lines.push("Excluded paths:".to_string());
    lines.extend(selection.excluded.iter().cloned());

    Ok(lines.join("\n"))
}

/// Local wall-clock time, UTC when the offset cannot be determined
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn format_error(err: time::error::Format) -> Error {
    Error::with_message(ErrorKind::Serialize, Span::empty(), err.to_string())
}
