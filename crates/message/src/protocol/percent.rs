//! RFC 3986 percent-encoding for uri components.
//!
//! Encoding is idempotent: a `%` that already starts a valid `%XX` triplet is kept as is,
//! so values that were stored encoded are never encoded twice.

use std::borrow::Cow;

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// The uri component a value belongs to; each one allows a slightly different set of
/// characters to appear unencoded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Component {
    UserInfo,
    Path,
    Query,
    Fragment,
}

impl Component {
    fn allows(self, byte: u8) -> bool {
        if is_unreserved(byte) || is_sub_delim(byte) {
            return true;
        }

        match self {
            Component::UserInfo => byte == b':',
            Component::Path => matches!(byte, b':' | b'@' | b'/'),
            Component::Query | Component::Fragment => matches!(byte, b':' | b'@' | b'/' | b'?'),
        }
    }
}

#[inline]
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}

#[inline]
fn is_sub_delim(byte: u8) -> bool {
    matches!(byte, b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'=')
}

/// Returns true if `bytes[index]` starts a valid `%XX` escape.
#[inline]
pub(crate) fn is_escape(bytes: &[u8], index: usize) -> bool {
    bytes[index] == b'%'
        && bytes.get(index + 1).is_some_and(u8::is_ascii_hexdigit)
        && bytes.get(index + 2).is_some_and(u8::is_ascii_hexdigit)
}

/// Percent-encodes every byte `component` does not allow unencoded.
pub fn encode(raw: &str, component: Component) -> Cow<'_, str> {
    let bytes = raw.as_bytes();
    let keep = |index: usize| component.allows(bytes[index]) || is_escape(bytes, index);

    if (0..bytes.len()).all(keep) {
        return Cow::Borrowed(raw);
    }

    let mut encoded = String::with_capacity(raw.len() + 16);
    for (index, &byte) in bytes.iter().enumerate() {
        if keep(index) {
            encoded.push(char::from(byte));
        } else {
            encoded.push('%');
            encoded.push(char::from(HEX_UPPER[usize::from(byte >> 4)]));
            encoded.push(char::from(HEX_UPPER[usize::from(byte & 0x0f)]));
        }
    }

    Cow::Owned(encoded)
}

/// Decodes `%XX` escapes; invalid escapes are left untouched and invalid utf-8 is replaced.
pub fn decode(raw: &str) -> Cow<'_, str> {
    if !raw.contains('%') {
        return Cow::Borrowed(raw);
    }

    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if is_escape(bytes, index) {
            decoded.push((hex_value(bytes[index + 1]) << 4) | hex_value(bytes[index + 2]));
            index += 3;
        } else {
            decoded.push(bytes[index]);
            index += 1;
        }
    }

    match String::from_utf8(decoded) {
        Ok(decoded) => Cow::Owned(decoded),
        Err(e) => Cow::Owned(String::from_utf8_lossy(e.as_bytes()).into_owned()),
    }
}

#[inline]
fn hex_value(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        b'A'..=b'F' => byte - b'A' + 10,
        _ => 0,
    }
}
