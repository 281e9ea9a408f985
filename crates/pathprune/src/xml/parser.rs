//! XML parser implementation

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::cursor::Cursor;
use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::xml::encoding;
use crate::xml::model::{Content, Document, Element};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Replacement text produced by declared entities, summed over a document
const MAX_EXPANSION: usize = 1 << 20;
/// Entities referring to entities, at most this deep
const MAX_ENTITY_DEPTH: u8 = 16;

/// XML parser configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Deepest element nesting accepted
    pub max_depth: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_depth: 128 }
    }
}

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    input: &'a [u8],
    config: Config,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a parser with custom limits
    pub fn with_config(input: &'a [u8], config: Config) -> Self {
        Self { input, config }
    }

    /// Parse an XML document
    ///
    /// The input is decoded per its byte order mark or declared encoding
    /// first.
    pub fn parse(&self) -> Result<Document> {
        let text = encoding::decode(self.input)?;
        Reader::new(&text, self.config).document()
    }
}

/// Single pass over decoded UTF-8 input
#[derive(Debug)]
struct Reader<'a> {
    cursor: Cursor<'a>,
    config: Config,
    depth: u16,
    /// Internal general entities from the doctype subset
    entities: HashMap<String, String>,
    expanded: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            depth: 0,
            entities: HashMap::new(),
            expanded: 0,
        }
    }

    fn document(&mut self) -> Result<Document> {
        if self.cursor.starts_with(BOM) {
            self.cursor.advance_by(BOM.len());
        }

        self.skip_misc()?;
        match self.cursor.current() {
            None => return Err(Error::at(ErrorKind::MissingRoot, self.cursor.position())),
            Some(b'<') => {}
            Some(_) => return Err(self.error_here(ErrorKind::InvalidToken, "expected root element")),
        }

        let root = self.parse_element()?;
        self.skip_misc()?;

        if !self.cursor.is_eof() {
            return Err(self.error_here(ErrorKind::InvalidToken, "content after root element"));
        }

        debug!(
            root = %root.name,
            bytes = self.cursor.pos(),
            entities = self.entities.len(),
            "parsed xml document"
        );
        Ok(Document { root })
    }

    /// Whitespace, comments, processing instructions and doctype outside the root
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<?") {
                self.cursor.advance_by(2);
                self.skip_until(b"?>")?;
            } else if self.cursor.starts_with(b"<!--") {
                self.cursor.advance_by(4);
                self.skip_until(b"-->")?;
            } else if self.cursor.starts_with(b"<!DOCTYPE") {
                self.cursor.advance_by(9);
                self.parse_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element> {
        let start = self.cursor.position();
        self.expect_byte(b'<')?;

        if self.depth >= self.config.max_depth {
            return Err(Error::at(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                start,
            ));
        }

        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            return Ok(Element {
                name,
                attributes,
                children: Vec::new(),
            });
        }
        self.expect_byte(b'>')?;

        self.depth += 1;
        let children = self.parse_content(&name)?;
        self.depth -= 1;

        Ok(Element {
            name,
            attributes,
            children,
        })
    }

    /// Content up to and including the matching close tag
    fn parse_content(&mut self, name: &str) -> Result<Vec<Content>> {
        let mut children = Vec::new();
        let mut text = String::new();

        loop {
            if self.cursor.is_eof() {
                return Err(self.error_here(
                    ErrorKind::UnexpectedEof,
                    format!("unterminated element <{name}>"),
                ));
            }

            if self.cursor.starts_with(b"</") {
                let pos = self.cursor.position();
                self.cursor.advance_by(2);
                let found = self.parse_name()?;
                if found != name {
                    return Err(Error::at(
                        ErrorKind::MismatchedTag {
                            expected: name.to_string(),
                            found,
                        },
                        pos,
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                break;
            }

            if self.cursor.starts_with(b"<![CDATA[") {
                self.cursor.advance_by(9);
                let raw = self.take_until(b"]]>")?;
                text.push_str(&bytes_to_string(raw, self.cursor.position())?);
                continue;
            }

            if self.cursor.starts_with(b"<!--") {
                self.cursor.advance_by(4);
                self.skip_until(b"-->")?;
                continue;
            }

            if self.cursor.starts_with(b"<?") {
                self.cursor.advance_by(2);
                self.skip_until(b"?>")?;
                continue;
            }

            if self.cursor.current() == Some(b'<') {
                flush_text(&mut text, &mut children);
                let child = self.parse_element()?;
                children.push(Content::Element(child));
                continue;
            }

            text.push_str(&self.parse_text()?);
        }

        flush_text(&mut text, &mut children);
        Ok(children)
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) => {}
                None => {
                    return Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated start tag"))
                }
            }

            let pos = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(Error::at(ErrorKind::DuplicateAttribute { name }, pos));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(
                    self.error_here(ErrorKind::InvalidToken, "expected quoted attribute value")
                )
            }
        };
        self.cursor.advance();

        let pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                // literal whitespace is normalized; character references survive
                let text = bytes_to_string(raw, pos)?.replace(['\t', '\n'], " ");
                return self.decode_entities(&text, pos);
            }
            if b == b'<' {
                return Err(self.error_here(ErrorKind::InvalidToken, "'<' in attribute value"));
            }
            self.cursor.advance();
        }

        Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated attribute value"))
    }

    fn parse_text(&mut self) -> Result<String> {
        let pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let text = bytes_to_string(self.cursor.slice_from(start), pos)?;
        self.decode_entities(&text, pos)
    }

    fn parse_name(&mut self) -> Result<String> {
        let pos = self.cursor.position();
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(first) if is_name_start(first) => self.cursor.advance(),
            Some(_) => return Err(self.error_here(ErrorKind::InvalidToken, "expected name")),
            None => return Err(self.error_here(ErrorKind::UnexpectedEof, "expected name")),
        }

        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_string(self.cursor.slice_from(start), pos)
    }

    /// Doctype after `<!DOCTYPE`, recording internal entity declarations
    fn parse_doctype(&mut self) -> Result<()> {
        loop {
            match self.cursor.current() {
                Some(b'>') => {
                    self.cursor.advance();
                    return Ok(());
                }
                Some(b'[') => {
                    self.cursor.advance();
                    self.parse_internal_subset()?;
                }
                Some(quote @ (b'"' | b'\'')) => {
                    self.cursor.advance();
                    self.skip_until(&[quote])?;
                }
                Some(_) => self.cursor.advance(),
                None => {
                    return Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated doctype"))
                }
            }
        }
    }

    fn parse_internal_subset(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.consume(b']') {
                return Ok(());
            }

            if self.cursor.starts_with(b"<!--") {
                self.cursor.advance_by(4);
                self.skip_until(b"-->")?;
            } else if self.cursor.starts_with(b"<?") {
                self.cursor.advance_by(2);
                self.skip_until(b"?>")?;
            } else if self.cursor.starts_with(b"<!ENTITY") {
                self.cursor.advance_by(8);
                self.parse_entity_declaration()?;
            } else if self.cursor.starts_with(b"<!") {
                self.skip_declaration()?;
            } else if self.cursor.current() == Some(b'%') {
                // parameter entity reference
                self.skip_until(b";")?;
            } else if self.cursor.is_eof() {
                return Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated doctype"));
            } else {
                return Err(self.error_here(ErrorKind::InvalidToken, "unexpected content in doctype"));
            }
        }
    }

    /// `<!ENTITY name "value">`; external and parameter entities are skipped
    fn parse_entity_declaration(&mut self) -> Result<()> {
        self.cursor.skip_whitespace();
        if self.cursor.current() == Some(b'%')
            && self.cursor.peek(1).is_some_and(|b| b.is_ascii_whitespace())
        {
            return self.skip_declaration();
        }

        let name = self.parse_name()?;
        self.cursor.skip_whitespace();
        if let Some(quote @ (b'"' | b'\'')) = self.cursor.current() {
            self.cursor.advance();
            let pos = self.cursor.position();
            let raw = self.take_until(&[quote])?;
            let value = expand_char_refs(&bytes_to_string(raw, pos)?, pos)?;
            // the first declaration of a name is binding
            self.entities.entry(name).or_insert(value);
        }
        self.skip_declaration()
    }

    /// Rest of a markup declaration up to its closing `>`
    fn skip_declaration(&mut self) -> Result<()> {
        loop {
            match self.cursor.current() {
                Some(b'>') => {
                    self.cursor.advance();
                    return Ok(());
                }
                Some(quote @ (b'"' | b'\'')) => {
                    self.cursor.advance();
                    self.skip_until(&[quote])?;
                }
                Some(_) => self.cursor.advance(),
                None => {
                    return Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated declaration"))
                }
            }
        }
    }

    fn decode_entities(&mut self, input: &str, pos: Pos) -> Result<String> {
        if !input.contains('&') {
            return Ok(input.to_string());
        }
        let mut out = String::with_capacity(input.len());
        self.expand_into(input, pos, 0, &mut out)?;
        Ok(out)
    }

    fn expand_into(&mut self, input: &str, pos: Pos, depth: u8, out: &mut String) -> Result<()> {
        let mut rest = input;
        while let Some(idx) = rest.find('&') {
            let (before, after) = rest.split_at(idx);
            out.push_str(before);

            let after = after.get(1..).unwrap_or_default();
            let Some(end) = after.find(';') else {
                return Err(invalid_entity(after.chars().take(16).collect(), pos));
            };
            let entity = after.get(..end).unwrap_or_default();

            if let Some(ch) = predefined_entity(entity) {
                out.push(ch);
            } else if let Some(value) = self.entities.get(entity).cloned() {
                self.expanded += value.len();
                if depth >= MAX_ENTITY_DEPTH || self.expanded > MAX_EXPANSION {
                    return Err(Error::with_message(
                        ErrorKind::InvalidEntity {
                            entity: entity.to_string(),
                        },
                        Span::at(pos),
                        format!("entity expansion limit exceeded at &{entity};"),
                    ));
                }
                self.expand_into(&value, pos, depth + 1, out)?;
            } else {
                return Err(invalid_entity(entity.to_string(), pos));
            }

            rest = after.get(end + 1..).unwrap_or_default();
        }
        out.push_str(rest);
        Ok(())
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        self.take_until(pattern).map(|_| ())
    }

    /// Bytes before `pattern`; the pattern itself is consumed
    fn take_until(&mut self, pattern: &[u8]) -> Result<&'a [u8]> {
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                let taken = self.cursor.slice_from(start);
                self.cursor.advance_by(pattern.len());
                return Ok(taken);
            }
            self.cursor.advance();
        }
        Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated markup"))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        match self.cursor.current() {
            Some(b) if b == expected => {
                self.cursor.advance();
                Ok(())
            }
            Some(_) => Err(self.error_here(
                ErrorKind::InvalidToken,
                format!("expected '{}'", char::from(expected)),
            )),
            None => Err(self.error_here(
                ErrorKind::UnexpectedEof,
                format!("expected '{}'", char::from(expected)),
            )),
        }
    }

    fn error_here(&self, kind: ErrorKind, message: impl Into<String>) -> Error {
        Error::with_message(kind, Span::at(self.cursor.position()), message)
    }
}

fn flush_text(text: &mut String, children: &mut Vec<Content>) {
    if !text.is_empty() {
        children.push(Content::Text(std::mem::take(text)));
    }
}

fn bytes_to_string(bytes: &[u8], pos: Pos) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| Error::at(ErrorKind::InvalidUtf8, pos))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn predefined_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => decode_numeric_entity(entity),
    }
}

/// Character references in an entity value; other references stay as written
fn expand_char_refs(value: &str, pos: Pos) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(idx) = rest.find("&#") {
        let (before, after) = rest.split_at(idx);
        out.push_str(before);
        let after = after.get(1..).unwrap_or_default();
        let Some(end) = after.find(';') else {
            return Err(invalid_entity(after.chars().take(16).collect(), pos));
        };
        let entity = after.get(..end).unwrap_or_default();
        let ch = decode_numeric_entity(entity)
            .ok_or_else(|| invalid_entity(entity.to_string(), pos))?;
        out.push(ch);
        rest = after.get(end + 1..).unwrap_or_default();
    }
    out.push_str(rest);
    Ok(out)
}

fn invalid_entity(entity: String, pos: Pos) -> Error {
    Error::at(ErrorKind::InvalidEntity { entity }, pos)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}
