//! Input decoding ahead of parsing
//!
//! The parser works on UTF-8 with `\n` line ends. UTF-16 is recognized by
//! its byte order mark or by the first `<?` of the declaration; otherwise the
//! declared `encoding` decides. Line ends are normalized afterwards, so
//! `\r\n` and a lone `\r` both become `\n`.

use std::borrow::Cow;

use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Windows-1252 code points for bytes 0x80..=0x9F; `None` where undefined
const WINDOWS_1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Ascii,
    Latin1,
    Windows1252,
    Utf16Le,
    Utf16Be,
}

impl Encoding {
    fn for_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "us-ascii" | "ascii" => Some(Self::Ascii),
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin-1" | "latin1" | "l1" => {
                Some(Self::Latin1)
            }
            "windows-1252" | "cp1252" => Some(Self::Windows1252),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "us-ascii",
            Self::Latin1 => "iso-8859-1",
            Self::Windows1252 => "windows-1252",
            Self::Utf16Le | Self::Utf16Be => "utf-16",
        }
    }
}

/// UTF-8 text of an XML document with normalized line ends
pub fn decode(input: &[u8]) -> Result<Cow<'_, [u8]>> {
    let encoding = detect(input)?;
    let text = match encoding {
        Encoding::Utf8 => Cow::Borrowed(input),
        Encoding::Ascii => {
            if !input.is_ascii() {
                return Err(invalid(encoding));
            }
            Cow::Borrowed(input)
        }
        Encoding::Latin1 => widen(input, encoding, |b| Some(char::from(b)))?,
        Encoding::Windows1252 => widen(input, encoding, |b| match b {
            0x80..=0x9F => WINDOWS_1252_HIGH
                .get(usize::from(b - 0x80))
                .copied()
                .flatten(),
            _ => Some(char::from(b)),
        })?,
        Encoding::Utf16Le => Cow::Owned(utf16(input, u16::from_le_bytes)?.into_bytes()),
        Encoding::Utf16Be => Cow::Owned(utf16(input, u16::from_be_bytes)?.into_bytes()),
    };
    if encoding != Encoding::Utf8 {
        debug!(encoding = encoding.name(), "decoded xml input");
    }
    Ok(normalize_line_ends(text))
}

fn detect(input: &[u8]) -> Result<Encoding> {
    match input {
        [0xFF, 0xFE, ..] | [b'<', 0, b'?', 0, ..] => return Ok(Encoding::Utf16Le),
        [0xFE, 0xFF, ..] | [0, b'<', 0, b'?', ..] => return Ok(Encoding::Utf16Be),
        _ => {}
    }
    // a byte order mark overrides the declaration
    if input.starts_with(UTF8_BOM) {
        return Ok(Encoding::Utf8);
    }
    let Some(label) = declared_encoding(input) else {
        return Ok(Encoding::Utf8);
    };
    Encoding::for_label(&label)
        .ok_or_else(|| Error::bare(ErrorKind::UnsupportedEncoding { encoding: label }))
}

/// Value of `encoding` in a leading `<?xml ...?>` declaration
fn declared_encoding(input: &[u8]) -> Option<String> {
    let decl = input.strip_prefix(b"<?xml")?;
    let end = decl.windows(2).position(|w| w == b"?>")?;
    let decl = decl.get(..end)?;

    let key = decl.windows(8).position(|w| w == b"encoding")?;
    let rest = decl.get(key + 8..)?.trim_ascii_start();
    let rest = rest.strip_prefix(b"=")?.trim_ascii_start();
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let value = rest.get(..rest.iter().position(|&b| b == quote)?)?;
    std::str::from_utf8(value).ok().map(str::to_string)
}

/// Map every byte through a single-byte code page
fn widen(
    input: &[u8],
    encoding: Encoding,
    map: impl Fn(u8) -> Option<char>,
) -> Result<Cow<'_, [u8]>> {
    if input.is_ascii() {
        return Ok(Cow::Borrowed(input));
    }
    let mut text = String::with_capacity(input.len() + input.len() / 2);
    for &b in input {
        text.push(map(b).ok_or_else(|| invalid(encoding))?);
    }
    Ok(Cow::Owned(text.into_bytes()))
}

fn utf16(input: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    let pairs = input.chunks_exact(2);
    if !pairs.remainder().is_empty() {
        return Err(invalid(Encoding::Utf16Le));
    }
    let units = pairs
        .filter_map(|pair| <[u8; 2]>::try_from(pair).ok())
        .map(unit);
    let mut text: String = char::decode_utf16(units)
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| invalid(Encoding::Utf16Le))?;
    if text.starts_with('\u{FEFF}') {
        text.remove(0);
    }
    Ok(text)
}

fn normalize_line_ends(text: Cow<'_, [u8]>) -> Cow<'_, [u8]> {
    if !text.contains(&b'\r') {
        return text;
    }
    let mut out = Vec::with_capacity(text.len());
    let mut bytes = text.iter().copied().peekable();
    while let Some(b) = bytes.next() {
        if b == b'\r' {
            if bytes.peek() == Some(&b'\n') {
                bytes.next();
            }
            out.push(b'\n');
        } else {
            out.push(b);
        }
    }
    Cow::Owned(out)
}

fn invalid(encoding: Encoding) -> Error {
    Error::bare(ErrorKind::InvalidEncoding {
        encoding: encoding.name().to_string(),
    })
}
