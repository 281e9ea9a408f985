//! Element/key paths and their enumeration
//!
//! A path joins the names from the root down to a node with `/`. XML paths
//! start at the root element's name; JSON paths start below the root value.
//! JSON array elements share their parent's path, so every object inside an
//! array contributes to the same set of paths.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::document::Document;
use crate::xml::Element;

/// Path separator
pub const SEPARATOR: char = '/';

/// Ordered set of paths
pub type PathSet = BTreeSet<String>;

/// Extend `parent` with one more name
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        let mut path = String::with_capacity(parent.len() + 1 + name.len());
        path.push_str(parent);
        path.push(SEPARATOR);
        path.push_str(name);
        path
    }
}

/// True when `path` or one of its ancestors is in `excluded`
pub fn is_pruned(path: &str, excluded: &PathSet) -> bool {
    excluded.contains(path)
        || path
            .match_indices(SEPARATOR)
            .any(|(idx, _)| path.get(..idx).is_some_and(|parent| excluded.contains(parent)))
}

/// Node reached during a path walk
#[derive(Clone, Copy, Debug)]
pub enum Node<'a> {
    Element(&'a Element),
    Value(&'a Value),
}

impl Node<'_> {
    /// True when the node carries a string value
    pub fn is_text(&self) -> bool {
        match self {
            Self::Element(element) => element.has_text(),
            Self::Value(value) => value.is_string(),
        }
    }
}

/// Visit every named node in pre-order together with its path
pub fn walk<'a>(doc: &'a Document, mut visit: impl FnMut(&str, Node<'a>)) {
    match doc {
        Document::Xml(xml) => {
            let root = &xml.root;
            visit(&root.name, Node::Element(root));
            walk_element(root, &root.name, &mut visit);
        }
        Document::Json(value) => walk_value(value, "", &mut visit),
    }
}

fn walk_element<'a>(element: &'a Element, path: &str, visit: &mut impl FnMut(&str, Node<'a>)) {
    for child in element.child_elements() {
        let child_path = join(path, &child.name);
        visit(&child_path, Node::Element(child));
        walk_element(child, &child_path, visit);
    }
}

fn walk_value<'a>(value: &'a Value, path: &str, visit: &mut impl FnMut(&str, Node<'a>)) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = join(path, key);
                visit(&child_path, Node::Value(child));
                walk_value(child, &child_path, visit);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_value(item, path, visit);
            }
        }
        _ => {}
    }
}

/// All distinct paths reachable from the root
pub fn enumerate_paths(doc: &Document) -> PathSet {
    let mut paths = PathSet::new();
    walk(doc, |path, _| {
        if !paths.contains(path) {
            paths.insert(path.to_string());
        }
    });
    debug!(count = paths.len(), "enumerated paths");
    paths
}

/// Occurrence counts for one path
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PathStats {
    pub path: String,
    /// Nodes found at this path
    pub occurrences: usize,
    /// Nodes at this path holding a string value
    pub text_values: usize,
}

/// Per-path overview, sorted by path
pub fn path_stats(doc: &Document) -> Vec<PathStats> {
    let mut stats: BTreeMap<String, PathStats> = BTreeMap::new();
    walk(doc, |path, node| {
        let entry = stats
            .entry(path.to_string())
            .or_insert_with(|| PathStats {
                path: path.to_string(),
                ..PathStats::default()
            });
        entry.occurrences += 1;
        if node.is_text() {
            entry.text_values += 1;
        }
    });
    stats.into_values().collect()
}
