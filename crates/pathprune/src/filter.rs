//! Filter configuration and exclusion-set computation
//!
//! A filter is an include list plus shell-style wildcard patterns. The
//! exclusion set is every known path missing from the include list, together
//! with every known path matched by a wildcard.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, ErrorKind, Result, Span};
use crate::path::{is_pruned, PathSet};

/// Suffix of saved filter files
pub const FILTER_SUFFIX: &str = ".filter.json";

/// Saved or exchanged filter configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Explicit allow-list; `None` keeps every known path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    /// Patterns whose matches are always excluded
    #[serde(default)]
    pub wildcards: Vec<String>,
}

/// Outcome of applying a filter to a set of known paths
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub included: PathSet,
    pub excluded: PathSet,
}

impl Selection {
    /// Split `known` around an exclusion set
    ///
    /// Paths below an excluded path disappear with it, so they are listed
    /// in neither set.
    pub fn from_exclusion(known: &PathSet, excluded: PathSet) -> Self {
        let included = known
            .iter()
            .filter(|path| !is_pruned(path, &excluded))
            .cloned()
            .collect();
        Self { included, excluded }
    }
}

impl FilterConfig {
    /// Filter that keeps every path
    pub fn keep_all() -> Self {
        Self::default()
    }

    pub fn new(include: impl IntoIterator<Item = String>, wildcards: Vec<String>) -> Self {
        Self {
            include: Some(include.into_iter().collect()),
            wildcards,
        }
    }

    /// Parse a filter from its JSON form
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|err| {
            Error::with_message(ErrorKind::InvalidFilter, Span::empty(), err.to_string())
        })
    }

    /// Two-space indented JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| Error::with_message(ErrorKind::Serialize, Span::empty(), err.to_string()))
    }

    /// Read a filter file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Write `<name>.filter.json` into `dir`, returning the file path
    pub fn save(&self, dir: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
        let path = dir.as_ref().join(filter_file_name(name));
        fs::write(&path, self.to_json_pretty()?)?;
        debug!(path = %path.display(), "saved filter");
        Ok(path)
    }

    /// Split `known` into included and excluded paths
    ///
    /// Include entries that name no known path are ignored.
    pub fn selection(&self, known: &PathSet) -> Result<Selection> {
        let wild = expand_wildcards(known, &self.wildcards)?;

        let mut excluded = match &self.include {
            None => PathSet::new(),
            Some(include) => {
                let include: PathSet = include.iter().cloned().collect();
                let unknown = include.difference(known).count();
                if unknown > 0 {
                    debug!(unknown, "filter includes paths absent from the document");
                }
                known.difference(&include).cloned().collect()
            }
        };
        excluded.extend(wild);

        let selection = Selection::from_exclusion(known, excluded);
        debug!(
            included = selection.included.len(),
            excluded = selection.excluded.len(),
            "computed selection"
        );
        Ok(selection)
    }
}

/// File name used for a saved filter called `name`
pub fn filter_file_name(name: &str) -> String {
    format!("{name}{FILTER_SUFFIX}")
}

/// Split a comma-separated pattern list, dropping blanks
pub fn parse_wildcards(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
        .map(str::to_string)
        .collect()
}

/// Compile patterns with shell semantics; `*` also matches `/`
///
/// Patterns follow `fnmatch`: braces and backslashes are ordinary
/// characters and an unclosed `[` matches itself.
pub fn compile_wildcards(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let Some(translated) = to_glob(pattern) else {
            debug!(%pattern, "pattern can never match");
            continue;
        };
        let glob = GlobBuilder::new(&translated)
            .literal_separator(false)
            .backslash_escape(false)
            .allow_unclosed_class(true)
            .build()
            .map_err(|err| {
                Error::with_message(
                    ErrorKind::InvalidPattern {
                        pattern: pattern.clone(),
                    },
                    Span::empty(),
                    err.to_string(),
                )
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|err| {
        Error::with_message(
            ErrorKind::InvalidPattern {
                pattern: patterns.join(","),
            },
            Span::empty(),
            err.to_string(),
        )
    })
}

/// Rewrite a shell pattern into globset syntax with the same matches
///
/// Runs of `*` collapse to one `*`, and characters globset would treat as
/// syntax are wrapped in a one-character class. `None` means the pattern
/// can never match.
fn to_glob(pattern: &str) -> Option<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;

    while let Some(&c) = chars.get(i) {
        i += 1;
        match c {
            '*' => {
                while chars.get(i) == Some(&'*') {
                    i += 1;
                }
                out.push('*');
            }
            '?' => out.push('?'),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push_str(&class_to_glob(chars.get(i..end).unwrap_or_default())?);
                    i = end + 1;
                }
                None => out.push_str("[[]"),
            },
            '{' | '}' | '\\' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            c => out.push(c),
        }
    }
    Some(out)
}

/// Index of the `]` closing a class whose body starts at `start`
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    while chars.get(j).is_some_and(|c| *c != ']') {
        j += 1;
    }
    chars.get(j).map(|_| j)
}

// Characters with a meaning inside a globset class, with their neighbours.
// `]` must precede `^` so a piece split at `]` is split again at `^`.
const CLASS_SPECIALS: [(char, char, char); 4] = [
    ('!', ' ', '"'),
    ('-', ',', '.'),
    (']', '\\', '^'),
    ('^', ']', '_'),
];

/// Class body in shell syntax to an equivalent globset fragment
fn class_to_glob(body: &[char]) -> Option<String> {
    let (negated, body) = match body.split_first() {
        Some((&'!', rest)) => (true, rest),
        _ => (false, body),
    };

    let mut pieces = Vec::new();
    let mut k = 0;
    while let Some(&lo) = body.get(k) {
        match (body.get(k + 1), body.get(k + 2)) {
            (Some(&'-'), Some(&hi)) => {
                // reversed ranges match nothing
                if lo <= hi {
                    pieces.push((lo, hi));
                }
                k += 3;
            }
            _ => {
                pieces.push((lo, lo));
                k += 1;
            }
        }
    }

    let mut specials = Vec::new();
    for (special, before, after) in CLASS_SPECIALS {
        let mut split = Vec::with_capacity(pieces.len());
        for (lo, hi) in pieces {
            if lo <= special && special <= hi {
                specials.push(special);
                if lo < special {
                    split.push((lo, before));
                }
                if special < hi {
                    split.push((after, hi));
                }
            } else {
                split.push((lo, hi));
            }
        }
        pieces = split;
    }
    specials.sort_unstable();
    specials.dedup();

    if pieces.is_empty() && !negated && !specials.contains(&']') {
        return match specials.as_slice() {
            [] => None,
            [only] => Some(only.to_string()),
            many => Some(format!(
                "{{{}}}",
                many.iter().map(char::to_string).collect::<Vec<_>>().join(",")
            )),
        };
    }
    if pieces.is_empty() && specials.is_empty() {
        // `[!` with nothing excluded matches any character
        return Some("?".to_string());
    }

    let mut class = String::from(if negated { "[!" } else { "[" });
    if specials.contains(&']') {
        class.push(']');
    }
    for (lo, hi) in pieces {
        class.push(lo);
        if lo != hi {
            class.push('-');
            class.push(hi);
        }
    }
    for special in ['^', '!', '-'] {
        if specials.contains(&special) {
            class.push(special);
        }
    }
    class.push(']');
    Some(class)
}

/// Known paths matched by any of `patterns`
pub fn expand_wildcards(known: &PathSet, patterns: &[String]) -> Result<PathSet> {
    if patterns.is_empty() {
        return Ok(PathSet::new());
    }
    let set = compile_wildcards(patterns)?;
    Ok(known
        .iter()
        .filter(|path| set.is_match(path.as_str()))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(paths: &[&str]) -> PathSet {
        paths.iter().map(|p| (*p).to_string()).collect()
    }

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| (*p).to_string()).collect()
    }

    #[test]
    fn test_wildcard_selects_exact_matches() -> Result<()> {
        let known = set(&["a/x", "b/x", "a/y"]);
        let matched = expand_wildcards(&known, &patterns(&["*/x"]))?;
        assert_eq!(matched, set(&["a/x", "b/x"]));
        Ok(())
    }

    #[test]
    fn test_star_crosses_separator() -> Result<()> {
        let known = set(&["root", "root/meta", "root/a/meta", "root/a/metadata"]);
        let matched = expand_wildcards(&known, &patterns(&["*meta"]))?;
        assert_eq!(matched, set(&["root/a/meta", "root/meta"]));
        Ok(())
    }

    #[test]
    fn test_character_classes() -> Result<()> {
        let known = set(&["r/a1", "r/a2", "r/b1"]);
        assert_eq!(expand_wildcards(&known, &patterns(&["r/?1"]))?, set(&["r/a1", "r/b1"]));
        assert_eq!(expand_wildcards(&known, &patterns(&["r/[!a]*"]))?, set(&["r/b1"]));
        Ok(())
    }

    #[test]
    fn test_braces_are_literal() -> Result<()> {
        let known = set(&["a/{id}", "a/id", "a/x,y"]);
        assert_eq!(expand_wildcards(&known, &patterns(&["a/{id}"]))?, set(&["a/{id}"]));
        assert_eq!(expand_wildcards(&known, &patterns(&["a/{x,y}"]))?, PathSet::new());
        Ok(())
    }

    #[test]
    fn test_unclosed_bracket_is_literal() -> Result<()> {
        let known = set(&["a[b", "ab", "a[b]"]);
        assert_eq!(expand_wildcards(&known, &patterns(&["a[b"]))?, set(&["a[b"]));
        assert_eq!(expand_wildcards(&known, &patterns(&["a[b*"]))?, set(&["a[b", "a[b]"]));
        Ok(())
    }

    #[test]
    fn test_backslash_is_literal() -> Result<()> {
        let known = set(&[r"a\x", "a*", "ab"]);
        assert_eq!(expand_wildcards(&known, &patterns(&[r"a\*"]))?, set(&[r"a\x"]));
        Ok(())
    }

    #[test]
    fn test_class_edge_cases() -> Result<()> {
        let known = set(&["^", "!", "]", "-", "a", "b"]);
        // a leading caret is an ordinary member, not a negation
        assert_eq!(expand_wildcards(&known, &patterns(&["[^a]"]))?, set(&["^", "a"]));
        assert_eq!(expand_wildcards(&known, &patterns(&["[]a]"]))?, set(&["]", "a"]));
        assert_eq!(expand_wildcards(&known, &patterns(&["[!]a-]"]))?, set(&["^", "!", "b"]));
        assert_eq!(expand_wildcards(&known, &patterns(&["[!a]"]))?.len(), 5);
        assert_eq!(expand_wildcards(&known, &patterns(&["[^!]"]))?, set(&["^", "!"]));
        Ok(())
    }

    #[test]
    fn test_reversed_range_matches_nothing() -> Result<()> {
        let known = set(&["a", "m", "z"]);
        assert_eq!(expand_wildcards(&known, &patterns(&["[z-a]"]))?, PathSet::new());
        assert_eq!(expand_wildcards(&known, &patterns(&["[z-am]"]))?, set(&["m"]));
        assert_eq!(expand_wildcards(&known, &patterns(&["[!z-a]"]))?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_double_star_is_a_single_star() -> Result<()> {
        let known = set(&["a/b", "a/x/b", "ab"]);
        assert_eq!(expand_wildcards(&known, &patterns(&["a/**/b"]))?, set(&["a/x/b"]));
        assert_eq!(expand_wildcards(&known, &patterns(&["a**b"]))?, known);
        Ok(())
    }

    #[test]
    fn test_parse_wildcards() {
        assert_eq!(
            parse_wildcards(" */id , ,meta*,"),
            vec!["*/id".to_string(), "meta*".to_string()]
        );
        assert!(parse_wildcards("").is_empty());
    }

    #[test]
    fn test_selection_include_minus_wildcards() -> Result<()> {
        let known = set(&["r", "r/a", "r/b", "r/c"]);
        let filter = FilterConfig::new(
            patterns(&["r", "r/a", "r/b", "r/zzz"]),
            patterns(&["*/b"]),
        );
        let selection = filter.selection(&known)?;
        assert_eq!(selection.excluded, set(&["r/b", "r/c"]));
        assert_eq!(selection.included, set(&["r", "r/a"]));
        Ok(())
    }

    #[test]
    fn test_descendants_of_excluded_are_not_included() -> Result<()> {
        let known = set(&["r", "r/a", "r/a/b", "r/a/b/c", "r/ab"]);
        let filter = FilterConfig::new(patterns(&["r", "r/a/b", "r/a/b/c", "r/ab"]), Vec::new());
        let selection = filter.selection(&known)?;
        assert_eq!(selection.excluded, set(&["r/a"]));
        assert_eq!(selection.included, set(&["r", "r/ab"]));
        Ok(())
    }

    #[test]
    fn test_missing_include_keeps_everything() -> Result<()> {
        let known = set(&["a", "b"]);
        let filter = FilterConfig::from_json(r#"{"wildcards": ["b"]}"#)?;
        assert_eq!(filter.include, None);
        let selection = filter.selection(&known)?;
        assert_eq!(selection.included, set(&["a"]));
        assert_eq!(selection.excluded, set(&["b"]));
        Ok(())
    }

    #[test]
    fn test_json_shape() -> Result<()> {
        let filter = FilterConfig::new(patterns(&["a", "a/b"]), patterns(&["*/tmp"]));
        assert_eq!(
            filter.to_json_pretty()?,
            "{\n  \"include\": [\n    \"a\",\n    \"a/b\"\n  ],\n  \"wildcards\": [\n    \"*/tmp\"\n  ]\n}"
        );
        assert_eq!(FilterConfig::from_json(&filter.to_json_pretty()?)?, filter);
        Ok(())
    }

    #[test]
    fn test_invalid_filter_json() {
        let err = FilterConfig::from_json(r#"{"include": "a"}"#).err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::InvalidFilter));
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let filter = FilterConfig::new(patterns(&["x"]), Vec::new());
        let path = filter.save(dir.path(), "orders")?;
        assert!(path.ends_with("orders.filter.json"));
        assert_eq!(FilterConfig::load(&path)?, filter);
        Ok(())
    }
}
