//! Loaded document plus the active exclusion set

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, trace};

use crate::document::Document;
use crate::error::Result;
use crate::filter::{FilterConfig, Selection};
use crate::format::Format;
use crate::path::{enumerate_paths, path_stats, PathSet, PathStats};
use crate::prune::{measure_pruned, prune};

/// Original and filtered byte sizes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SizeReport {
    pub original: usize,
    pub filtered: usize,
}

impl SizeReport {
    /// Bytes saved; negative when the export is larger than the upload
    pub fn savings(&self) -> i64 {
        let original = i64::try_from(self.original).unwrap_or(i64::MAX);
        let filtered = i64::try_from(self.filtered).unwrap_or(i64::MAX);
        original - filtered
    }
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Original: {} bytes", self.original)?;
        writeln!(f, "Filtered: {} bytes", self.filtered)?;
        write!(f, "Savings:  {} bytes", self.savings())
    }
}

/// One uploaded document being filtered
///
/// The parsed original is never modified. Filtered sizes are remembered per
/// exclusion set, so toggling back to an earlier selection is free.
#[derive(Debug)]
pub struct Session {
    source_name: String,
    original: Document,
    original_size: usize,
    known: PathSet,
    exclusion: PathSet,
    sizes: Mutex<HashMap<PathSet, usize>>,
}

impl Session {
    /// Parse `bytes` using the format implied by `source_name`
    pub fn open(source_name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let source_name = source_name.into();
        let format = Format::for_path(&source_name)?;
        let original = Document::parse(bytes, format)?;
        let known = enumerate_paths(&original);
        debug!(source = %source_name, %format, paths = known.len(), "opened session");

        Ok(Self {
            source_name,
            original,
            original_size: bytes.len(),
            known,
            exclusion: PathSet::new(),
            sizes: Mutex::new(HashMap::new()),
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// File stem of the source name
    pub fn source_stem(&self) -> &str {
        Path::new(&self.source_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.source_name)
    }

    pub fn format(&self) -> Format {
        self.original.format()
    }

    /// The unmodified parsed document
    pub fn document(&self) -> &Document {
        &self.original
    }

    /// Size of the upload in bytes
    pub fn original_size(&self) -> usize {
        self.original_size
    }

    /// Every path in the original document
    pub fn paths(&self) -> &PathSet {
        &self.known
    }

    pub fn stats(&self) -> Vec<PathStats> {
        path_stats(&self.original)
    }

    pub fn exclusion(&self) -> &PathSet {
        &self.exclusion
    }

    pub fn set_exclusion(&mut self, exclusion: PathSet) {
        self.exclusion = exclusion;
    }

    /// Replace the exclusion set with the one `filter` selects
    pub fn apply(&mut self, filter: &FilterConfig) -> Result<Selection> {
        let selection = filter.selection(&self.known)?;
        self.exclusion = selection.excluded.clone();
        Ok(selection)
    }

    /// Included and excluded paths under the active exclusion set
    pub fn selection(&self) -> Selection {
        Selection::from_exclusion(&self.known, self.exclusion.clone())
    }

    /// Pruned copy for the active exclusion set
    pub fn pruned(&self) -> Document {
        prune(&self.original, &self.exclusion)
    }

    /// Serialized size after pruning with `exclusion`
    pub fn filtered_size(&self, exclusion: &PathSet) -> Result<usize> {
        if let Some(size) = self.sizes.lock().get(exclusion) {
            trace!(size, "size cache hit");
            return Ok(*size);
        }
        let size = measure_pruned(&self.original, exclusion)?;
        self.sizes.lock().insert(exclusion.clone(), size);
        Ok(size)
    }

    /// Sizes for the active exclusion set
    pub fn size_report(&self) -> Result<SizeReport> {
        Ok(SizeReport {
            original: self.original_size,
            filtered: self.filtered_size(&self.exclusion)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn set(paths: &[&str]) -> PathSet {
        paths.iter().map(|p| (*p).to_string()).collect()
    }

    #[test]
    fn test_open_detects_format() -> Result<()> {
        let session = Session::open("data/export.XML", b"<root><a/></root>")?;
        assert_eq!(session.format(), Format::Xml);
        assert_eq!(session.source_stem(), "export");
        assert_eq!(session.paths(), &set(&["root", "root/a"]));
        assert_eq!(session.original_size(), 17);
        Ok(())
    }

    #[test]
    fn test_open_rejects_unknown_extension() {
        let err = Session::open("notes.txt", b"{}").err();
        assert!(matches!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_apply_filter_updates_exclusion() -> Result<()> {
        let mut session = Session::open("in.json", br#"{"a": 1, "b": {"c": 2}}"#)?;
        let selection = session.apply(&FilterConfig::new(
            vec!["a".to_string(), "b".to_string(), "b/c".to_string()],
            vec!["*c".to_string()],
        ))?;
        assert_eq!(selection.excluded, set(&["b/c"]));
        assert_eq!(session.exclusion(), &set(&["b/c"]));
        assert_eq!(session.selection(), selection);
        Ok(())
    }

    #[test]
    fn test_size_report_and_cache() -> Result<()> {
        let mut session = Session::open("in.xml", b"<root><a>1</a><b>2</b></root>")?;
        let full = session.size_report()?;
        session.set_exclusion(set(&["root/b"]));
        let smaller = session.size_report()?;
        assert!(smaller.filtered < full.filtered);
        assert_eq!(session.sizes.lock().len(), 2);

        session.set_exclusion(PathSet::new());
        assert_eq!(session.size_report()?, full);
        assert_eq!(session.sizes.lock().len(), 2);
        Ok(())
    }

    #[test]
    fn test_savings_can_be_negative() {
        let report = SizeReport {
            original: 10,
            filtered: 25,
        };
        assert_eq!(report.savings(), -15);
        assert!(report.to_string().contains("Savings:  -15 bytes"));
    }

    #[test]
    fn test_original_is_not_mutated() -> Result<()> {
        let mut session = Session::open("in.json", br#"{"a": {"x": 1}}"#)?;
        let before = session.document().clone();
        session.set_exclusion(set(&["a/x"]));
        let _ = session.pruned();
        let _ = session.size_report()?;
        assert_eq!(session.document(), &before);
        Ok(())
    }
}
