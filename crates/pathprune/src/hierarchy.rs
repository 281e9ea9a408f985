//! JSON rendering of a document's hierarchy for previews

use serde_json::{Map, Value};

use crate::document::Document;
use crate::xml::Element;

const ATTRIBUTES_KEY: &str = "@attributes";
const TEXT_KEY: &str = "#text";

/// Hierarchy of `doc` as a JSON value
///
/// JSON documents are returned as they are. An XML document becomes
/// `{root_name: element}`; an element with neither attributes nor child
/// elements collapses to its trimmed text, anything else becomes an object
/// with optional `@attributes` and `#text` entries plus one entry per child
/// name, where repeated names collect into an array.
pub fn hierarchy(doc: &Document) -> Value {
    match doc {
        Document::Json(value) => value.clone(),
        Document::Xml(xml) => {
            let mut root = Map::new();
            root.insert(xml.root.name.clone(), element_to_value(&xml.root));
            Value::Object(root)
        }
    }
}

fn element_to_value(element: &Element) -> Value {
    let text = element.text();
    let text = text.trim();

    if element.attributes.is_empty() && element.child_elements().next().is_none() {
        return Value::String(text.to_string());
    }

    let mut obj = Map::new();
    if !element.attributes.is_empty() {
        let attrs = element
            .attributes
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();
        obj.insert(ATTRIBUTES_KEY.to_string(), Value::Object(attrs));
    }
    if !text.is_empty() {
        obj.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
    }

    for child in element.child_elements() {
        let value = element_to_value(child);
        match obj.get_mut(&child.name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                obj.insert(child.name.clone(), value);
            }
        }
    }

    Value::Object(obj)
}
