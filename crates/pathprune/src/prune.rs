//! Path-based pruning
//!
//! Pruning never mutates its input. Each retained node is rebuilt from the
//! original, and an excluded node is skipped before its subtree is visited.

use serde_json::{Map, Value};
use tracing::debug;

use crate::document::Document;
use crate::error::Result;
use crate::path::{join, PathSet};
use crate::xml::{self, Content, Element};

/// Copy of `doc` without any node whose path is in `excluded`
pub fn prune(doc: &Document, excluded: &PathSet) -> Document {
    let pruned = match doc {
        Document::Xml(xml) => Document::Xml(xml::Document {
            root: prune_root(&xml.root, excluded),
        }),
        Document::Json(value) => Document::Json(prune_value(value, "", excluded)),
    };
    debug!(excluded = excluded.len(), "pruned document");
    pruned
}

/// Serialized size of a document in bytes
pub fn measure(doc: &Document) -> Result<usize> {
    doc.to_bytes().map(|bytes| bytes.len())
}

/// Serialized size of the pruned copy of `doc`
pub fn measure_pruned(doc: &Document, excluded: &PathSet) -> Result<usize> {
    if excluded.is_empty() {
        return measure(doc);
    }
    measure(&prune(doc, excluded))
}

// The root is always kept; an excluded root path only empties it.
fn prune_root(root: &Element, excluded: &PathSet) -> Element {
    if excluded.contains(&root.name) {
        return Element {
            name: root.name.clone(),
            attributes: root.attributes.clone(),
            children: Vec::new(),
        };
    }
    prune_element(root, &root.name, excluded)
}

fn prune_element(element: &Element, path: &str, excluded: &PathSet) -> Element {
    let mut children = Vec::with_capacity(element.children.len());
    let mut dropped_previous = false;

    for child in &element.children {
        match child {
            Content::Element(child) => {
                let child_path = join(path, &child.name);
                dropped_previous = excluded.contains(&child_path);
                if !dropped_previous {
                    children.push(Content::Element(prune_element(child, &child_path, excluded)));
                }
            }
            Content::Text(text) => {
                // indentation that trailed a removed element goes with it
                let tail = std::mem::take(&mut dropped_previous);
                if !(tail && text.trim().is_empty()) {
                    children.push(Content::Text(text.clone()));
                }
            }
        }
    }

    Element {
        name: element.name.clone(),
        attributes: element.attributes.clone(),
        children,
    }
}

fn prune_value(value: &Value, path: &str, excluded: &PathSet) -> Value {
    match value {
        Value::Object(map) => {
            let mut kept = Map::with_capacity(map.len());
            for (key, child) in map {
                let child_path = join(path, key);
                if !excluded.contains(&child_path) {
                    kept.insert(key.clone(), prune_value(child, &child_path, excluded));
                }
            }
            Value::Object(kept)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| prune_value(item, path, excluded))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use crate::path::enumerate_paths;

    fn set(paths: &[&str]) -> PathSet {
        paths.iter().map(|p| (*p).to_string()).collect()
    }

    fn xml_doc(input: &str) -> Result<Document> {
        Document::parse(input.as_bytes(), Format::Xml)
    }

    fn rendered(doc: &Document) -> Result<String> {
        Ok(String::from_utf8_lossy(&doc.to_bytes()?).into_owned())
    }

    #[test]
    fn test_xml_removes_every_instance() -> Result<()> {
        let doc = xml_doc("<root><a>1</a><b>2</b><a>3</a></root>")?;
        let pruned = prune(&doc, &set(&["root/a"]));
        assert!(rendered(&pruned)?.ends_with("<root><b>2</b></root>"));
        Ok(())
    }

    #[test]
    fn test_xml_indentation_tail_follows_removed_element() -> Result<()> {
        let doc = xml_doc("<root>\n  <a>1</a>\n  <b>2</b>\n  <c>3</c>\n</root>")?;
        let pruned = prune(&doc, &set(&["root/b"]));
        assert!(rendered(&pruned)?.ends_with("<root>\n  <a>1</a>\n  <c>3</c>\n</root>"));
        Ok(())
    }

    #[test]
    fn test_xml_mixed_text_is_kept() -> Result<()> {
        let doc = xml_doc("<p>one <b>two</b> three</p>")?;
        let pruned = prune(&doc, &set(&["p/b"]));
        assert!(rendered(&pruned)?.ends_with("<p>one  three</p>"));
        Ok(())
    }

    #[test]
    fn test_xml_excluded_root_keeps_attributes_only() -> Result<()> {
        let doc = xml_doc("<root v=\"1\"><a/>text</root>")?;
        let pruned = prune(&doc, &set(&["root"]));
        assert!(rendered(&pruned)?.ends_with("<root v=\"1\" />"));
        assert_eq!(enumerate_paths(&pruned), set(&["root"]));
        Ok(())
    }

    #[test]
    fn test_xml_attributes_are_not_paths() -> Result<()> {
        let doc = xml_doc("<root a=\"1\"><a/></root>")?;
        let pruned = prune(&doc, &set(&["root/a"]));
        assert!(rendered(&pruned)?.ends_with("<root a=\"1\" />"));
        Ok(())
    }

    #[test]
    fn test_json_nested_arrays_share_path() -> Result<()> {
        let doc = Document::parse(
            br#"{"rows": [[{"id": 1, "tmp": 0}], [{"id": 2, "tmp": 0}]]}"#,
            Format::Json,
        )?;
        let pruned = prune(&doc, &set(&["rows/tmp"]));
        let expected: Value = serde_json::json!({"rows": [[{"id": 1}], [{"id": 2}]]});
        assert_eq!(pruned, Document::Json(expected));
        Ok(())
    }

    #[test]
    fn test_input_is_untouched() -> Result<()> {
        let doc = xml_doc("<root><a/><b/></root>")?;
        let before = doc.clone();
        let _ = prune(&doc, &set(&["root/a", "root/b"]));
        assert_eq!(doc, before);
        Ok(())
    }

    #[test]
    fn test_measure_pruned_shrinks() -> Result<()> {
        let doc = xml_doc("<root><a>1</a><b>2</b></root>")?;
        let full = measure(&doc)?;
        assert_eq!(measure_pruned(&doc, &PathSet::new())?, full);
        assert!(measure_pruned(&doc, &set(&["root/b"]))? < full);
        Ok(())
    }
}
