//! XML serialization

use crate::xml::model::{Content, Document, Element};

/// Header written before the root element
pub const DECLARATION: &str = "<?xml version='1.0' encoding='utf-8'?>\n";

/// Serialize a document with its declaration
pub fn to_string(doc: &Document) -> String {
    let mut output = String::from(DECLARATION);
    write_element(&doc.root, &mut output);
    output
}

/// Serialize a document to UTF-8 bytes
pub fn to_bytes(doc: &Document) -> Vec<u8> {
    to_string(doc).into_bytes()
}

/// Serialize a single element without a declaration
pub fn element_to_string(element: &Element) -> String {
    let mut output = String::new();
    write_element(element, &mut output);
    output
}

fn write_element(element: &Element, output: &mut String) {
    output.push('<');
    output.push_str(&element.name);

    for (key, value) in &element.attributes {
        output.push(' ');
        output.push_str(key);
        output.push_str("=\"");
        escape_attribute(value, output);
        output.push('"');
    }

    if element.children.is_empty() {
        output.push_str(" />");
        return;
    }

    output.push('>');
    for child in &element.children {
        match child {
            Content::Element(child) => write_element(child, output),
            Content::Text(text) => escape_text(text, output),
        }
    }
    output.push_str("</");
    output.push_str(&element.name);
    output.push('>');
}

fn escape_text(input: &str, output: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(ch),
        }
    }
}

fn escape_attribute(input: &str, output: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\n' => output.push_str("&#10;"),
            '\r' => output.push_str("&#13;"),
            '\t' => output.push_str("&#09;"),
            _ => output.push(ch),
        }
    }
}
