//! Case-insensitive header collection.
//!
//! Names are normalized to ASCII lowercase when stored, so `Content-Type` and `content-type`
//! address the same entry. Every entry holds one or more values in the order they were added.

use std::fmt;

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::trace;

use crate::ensure;
use crate::protocol::MessageError;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Headers {
    map: IndexMap<String, Vec<String>>,
}

impl Headers {
    pub fn new() -> Headers {
        Headers { map: IndexMap::with_capacity(16) }
    }

    /// Checks that `name` can be used as a header name.
    ///
    /// Any string is accepted except names containing CR or LF.
    pub fn check_name(name: &str) -> Result<(), MessageError> {
        ensure!(
            !name.bytes().any(|b| matches!(b, b'\r' | b'\n')),
            MessageError::invalid_argument(format!("invalid header name: {name:?}"))
        );
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.map.contains_key(normalize(name).as_str())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the values of `name`, or an empty slice if absent.
    pub fn get(&self, name: &str) -> &[String] {
        self.map.get(normalize(name).as_str()).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the values of `name` joined with `", "`, or an empty string if absent.
    pub fn get_line(&self, name: &str) -> String {
        self.get(name).join(", ")
    }

    /// Replaces every value of `name`.
    pub fn set<V: IntoHeaderValues>(&mut self, name: &str, values: V) -> Result<(), MessageError> {
        Self::check_name(name)?;
        let values = values.into_header_values();
        if values.is_empty() {
            self.map.shift_remove(normalize(name).as_str());
        } else {
            self.map.insert(normalize(name), values);
        }
        Ok(())
    }

    /// Appends to the values of `name`, behaving as [`Headers::set`] if it is absent.
    pub fn add<V: IntoHeaderValues>(&mut self, name: &str, values: V) -> Result<(), MessageError> {
        Self::check_name(name)?;
        let mut values = values.into_header_values();
        if values.is_empty() {
            return Ok(());
        }

        match self.map.entry(normalize(name)) {
            Entry::Occupied(mut entry) => entry.get_mut().append(&mut values),
            Entry::Vacant(entry) => {
                entry.insert(values);
            }
        }
        Ok(())
    }

    /// Removes `name`; absent names are ignored.
    pub fn unset(&mut self, name: &str) {
        self.map.shift_remove(normalize(name).as_str());
    }

    /// Replaces `name` with a single value, for names known to be valid.
    pub(crate) fn replace(&mut self, name: &'static str, value: String) {
        self.map.insert(normalize(name), vec![value]);
    }

    /// Iterates over `(normalized name, values)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.map.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

fn normalize(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a [String]);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Converts an `http::HeaderMap`, skipping values that are not valid utf-8.
impl From<&http::HeaderMap> for Headers {
    fn from(header_map: &http::HeaderMap) -> Self {
        let mut headers = Headers::new();
        for (name, value) in header_map {
            match value.to_str() {
                Ok(value) => headers.map.entry(name.as_str().to_owned()).or_default().push(value.to_owned()),
                Err(e) => trace!(header = name.as_str(), cause = %e, "skipped non utf-8 header value"),
            }
        }
        headers
    }
}

/// Values accepted by [`Headers::set`] and [`Headers::add`]: a single value, or a sequence.
pub trait IntoHeaderValues {
    fn into_header_values(self) -> Vec<String>;
}

impl IntoHeaderValues for &str {
    fn into_header_values(self) -> Vec<String> {
        vec![self.to_owned()]
    }
}

impl IntoHeaderValues for String {
    fn into_header_values(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoHeaderValues for &String {
    fn into_header_values(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl IntoHeaderValues for Vec<String> {
    fn into_header_values(self) -> Vec<String> {
        self
    }
}

impl IntoHeaderValues for Vec<&str> {
    fn into_header_values(self) -> Vec<String> {
        self.into_iter().map(str::to_owned).collect()
    }
}

impl IntoHeaderValues for &[&str] {
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(|value| (*value).to_owned()).collect()
    }
}

impl IntoHeaderValues for &[String] {
    fn into_header_values(self) -> Vec<String> {
        self.to_vec()
    }
}

impl<const N: usize> IntoHeaderValues for [&str; N] {
    fn into_header_values(self) -> Vec<String> {
        self.into_iter().map(str::to_owned).collect()
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "application/json").unwrap();

        for name in ["content-type", "CONTENT-TYPE", "Content-type", "cOnTeNt-TyPe"] {
            assert!(headers.has(name));
            assert_eq!(headers.get(name), ["application/json"]);
        }
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn set_replaces_values() {
        let mut headers = Headers::new();
        headers.set("Accept", ["text/html", "text/plain"]).unwrap();
        headers.set("accept", "application/json").unwrap();

        assert_eq!(headers.get("Accept"), ["application/json"]);
    }

    #[test]
    fn add_appends_values() {
        let mut headers = Headers::new();
        headers.add("X-Forwarded-For", "10.0.0.1").unwrap();
        headers.add("x-forwarded-for", vec!["10.0.0.2", "10.0.0.3"]).unwrap();

        assert_eq!(headers.get("X-Forwarded-For"), ["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        assert_eq!(headers.get_line("X-Forwarded-For"), "10.0.0.1, 10.0.0.2, 10.0.0.3");
    }

    #[test]
    fn absent_headers() {
        let mut headers = Headers::new();
        assert!(!headers.has("Host"));
        assert!(headers.get("Host").is_empty());
        assert_eq!(headers.get_line("Host"), "");

        headers.unset("Host");
        assert!(headers.is_empty());
    }

    #[test]
    fn unset_removes_any_spelling() {
        let mut headers = Headers::new();
        headers.set("Cache-Control", "no-cache").unwrap();
        headers.unset("CACHE-CONTROL");
        assert!(!headers.has("cache-control"));
    }

    #[test]
    fn line_breaks_in_names_are_rejected() {
        let mut headers = Headers::new();
        for name in ["Bad\r\nName", "Bad\nName", "\r"] {
            assert!(matches!(headers.set(name, "v"), Err(MessageError::InvalidArgument { .. })));
            assert!(matches!(headers.add(name, "v"), Err(MessageError::InvalidArgument { .. })));
        }
        assert!(headers.is_empty());

        headers.set("Remote Address", "127.0.0.1").unwrap();
        headers.set("X:Colon", "1").unwrap();
        headers.set("", "empty").unwrap();
        assert!(headers.has("remote address"));
        assert_eq!(headers.get_line("x:colon"), "1");
        assert_eq!(headers.get_line(""), "empty");
    }

    #[test]
    fn iterates_in_insertion_order() {
        let mut headers = Headers::new();
        headers.set("Host", "localhost").unwrap();
        headers.set("Accept", "*/*").unwrap();
        headers.add("Host", "example.com").unwrap();

        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["host", "accept"]);
    }

    #[test]
    fn from_http_header_map() {
        let mut header_map = http::HeaderMap::new();
        header_map.append(http::header::ACCEPT, HeaderValue::from_static("text/html"));
        header_map.append(http::header::ACCEPT, HeaderValue::from_static("*/*"));
        header_map.insert(http::header::HOST, HeaderValue::from_static("127.0.0.1:8080"));
        header_map.insert("x-binary", HeaderValue::from_bytes(b"\xfa\xfb").unwrap());

        let headers = Headers::from(&header_map);

        assert_eq!(headers.get("Accept"), ["text/html", "*/*"]);
        assert_eq!(headers.get_line("host"), "127.0.0.1:8080");
        assert!(!headers.has("x-binary"));
    }
}
