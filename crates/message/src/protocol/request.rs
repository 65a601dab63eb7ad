//! Requests: a [`Message`] plus method, request target and [`Uri`].

use tracing::debug;

use crate::codec::decode_head;
use crate::protocol::{HttpError, HttpMessage, Message, ParseError, Stream, Uri};

#[derive(Debug, Clone)]
pub struct Request {
    message: Message,
    method: String,
    target: Option<String>,
    uri: Uri,
}

impl Default for Request {
    fn default() -> Self {
        Self { message: Message::default(), method: "GET".to_owned(), target: None, uri: Uri::default() }
    }
}

impl Request {
    /// Creates a request, taking the `Host` header from `uri` when it has a host.
    pub fn new(method: &str, uri: Uri) -> Self {
        Request::default().with_method(method).with_uri(uri, false)
    }

    /// Assembles a request from decoded parts without touching its headers.
    pub fn from_parts(method: impl Into<String>, uri: Uri, message: Message) -> Self {
        Self { message, method: method.into(), target: None, uri }
    }

    /// Decodes a complete HTTP/1.x request; everything after the head becomes the body.
    pub fn parse(bytes: &[u8]) -> Result<Request, HttpError> {
        let (request, body_offset) = decode_head(bytes)?.ok_or(ParseError::Incomplete)?;
        Ok(request.with_body(Stream::from_bytes(&bytes[body_offset..])))
    }
}

impl HttpMessage for Request {
    fn message(&self) -> &Message {
        &self.message
    }

    fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }
}

/// Request line and target uri access, with the same derivation rules as [`HttpMessage`].
pub trait HttpRequest: HttpMessage {
    fn request(&self) -> &Request;

    fn request_mut(&mut self) -> &mut Request;

    /// Returns the explicit request target if one was set, otherwise the origin form of the uri.
    fn request_target(&self) -> String {
        let request = self.request();
        if let Some(target) = &request.target {
            return target.clone();
        }

        let path = request.uri.path();
        let mut target = if path.is_empty() { "/".to_owned() } else { path.into_owned() };
        let query = request.uri.query();
        if !query.is_empty() {
            target.push('?');
            target.push_str(&query);
        }
        target
    }

    /// Stores `target` verbatim, e.g. `*` or an absolute form.
    #[must_use]
    fn with_request_target(&self, target: &str) -> Self {
        let mut derived = self.clone();
        derived.request_mut().target = Some(target.to_owned());
        derived
    }

    fn method(&self) -> &str {
        &self.request().method
    }

    /// Replaces the method; its case is preserved.
    #[must_use]
    fn with_method(&self, method: &str) -> Self {
        let mut derived = self.clone();
        derived.request_mut().method = method.to_owned();
        derived
    }

    fn uri(&self) -> &Uri {
        &self.request().uri
    }

    /// Replaces the uri and keeps the `Host` header in sync with it.
    ///
    /// Unless `preserve_host` is set, a uri with a host overwrites the `Host` header. With
    /// `preserve_host`, the header is only filled in when it is missing or empty.
    #[must_use]
    fn with_uri(&self, uri: Uri, preserve_host: bool) -> Self {
        let mut derived = self.clone();
        let host = host_header(&uri);
        derived.request_mut().uri = uri;

        let Some(host) = host else {
            return derived;
        };

        let current = derived.header_line("host");
        if !preserve_host || current.is_empty() {
            debug!(previous = %current, host = %host, "synchronized host header with uri");
            derived.message_mut().headers_mut().replace("host", host);
        }
        derived
    }
}

impl HttpRequest for Request {
    fn request(&self) -> &Request {
        self
    }

    fn request_mut(&mut self) -> &mut Request {
        self
    }
}

fn host_header(uri: &Uri) -> Option<String> {
    if uri.host().is_empty() {
        return None;
    }
    Some(match uri.port() {
        Some(port) => format!("{}:{port}", uri.host()),
        None => uri.host().to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::protocol::ProtocolVersion;

    fn uri(raw: &str) -> Uri {
        Uri::parse(raw).unwrap()
    }

    #[test]
    fn defaults() {
        let request = Request::default();
        assert_eq!(request.method(), "GET");
        assert_eq!(request.request_target(), "/");
        assert_eq!(request.uri().to_string(), "");
        assert!(!request.has_header("host"));
    }

    #[test]
    fn new_takes_host_from_uri() {
        let request = Request::new("POST", uri("https://example.com:8443/upload"));

        assert_eq!(request.method(), "POST");
        assert_eq!(request.header_line("Host"), "example.com:8443");
        assert_eq!(request.request_target(), "/upload");
    }

    #[test]
    fn request_target_from_uri() {
        let request = Request::default().with_uri(uri("/items?x=1&y=2"), false);
        assert_eq!(request.request_target(), "/items?x=1&y=2");

        let request = Request::default().with_uri(uri("http://example.com"), false);
        assert_eq!(request.request_target(), "/");

        let request = Request::default().with_uri(uri("/a b"), false);
        assert_eq!(request.request_target(), "/a%20b");
    }

    #[test]
    fn explicit_request_target() {
        let request = Request::new("OPTIONS", uri("http://example.com/a"));
        let derived = request.with_request_target("*");

        assert_eq!(derived.request_target(), "*");
        assert_eq!(request.request_target(), "/a");
        assert_eq!(derived.uri().path(), "/a");
    }

    #[test]
    fn method_case_is_preserved() {
        let request = Request::default();
        let derived = request.with_method("patch");

        assert_eq!(derived.method(), "patch");
        assert_eq!(request.method(), "GET");
    }

    #[test]
    fn with_uri_updates_host() {
        let request = Request::new("GET", uri("http://foo.com/")).with_uri(uri("http://bar.com:8080/"), false);
        assert_eq!(request.header("host"), ["bar.com:8080"]);
    }

    #[test]
    fn with_uri_without_host_keeps_header() {
        let request = Request::new("GET", uri("http://foo.com/")).with_uri(uri("/relative"), false);
        assert_eq!(request.header_line("host"), "foo.com");
        assert_eq!(request.uri().host(), "");
    }

    #[test]
    fn with_uri_preserving_host() {
        let request = Request::new("GET", uri("http://foo.com/"));

        let preserved = request.with_uri(uri("http://bar.com/"), true);
        assert_eq!(preserved.header_line("host"), "foo.com");
        assert_eq!(preserved.uri().host(), "bar.com");

        let filled = Request::default().with_uri(uri("http://bar.com/"), true);
        assert_eq!(filled.header_line("host"), "bar.com");

        let emptied = request.with_header("Host", "").unwrap().with_uri(uri("http://baz.com/"), true);
        assert_eq!(emptied.header_line("host"), "baz.com");
    }

    #[test]
    fn derivation_leaves_receiver_untouched() {
        let request = Request::new("GET", uri("http://foo.com/a?b=c"));
        let _ = request.with_uri(uri("http://bar.com/"), false);
        let _ = request.with_method("PUT");
        let _ = request.with_header("Accept", "*/*").unwrap();

        assert_eq!(request.header_line("host"), "foo.com");
        assert_eq!(request.method(), "GET");
        assert_eq!(request.uri().to_string(), "http://foo.com/a?b=c");
        assert!(!request.has_header("accept"));
    }

    #[test]
    fn parse_full_request() {
        let raw = indoc! {r##"
        POST /form?debug=1 HTTP/1.0
        Host: 127.0.0.1:8080
        Content-Type: application/x-www-form-urlencoded
        Content-Length: 7

        a=1&b=2"##};

        let request = Request::parse(raw.as_bytes()).unwrap();

        assert_eq!(request.method(), "POST");
        assert_eq!(request.protocol_version(), ProtocolVersion::Http10);
        assert_eq!(request.request_target(), "/form?debug=1");
        assert_eq!(request.header_line("content-type"), "application/x-www-form-urlencoded");
        assert_eq!(request.body().to_string(), "a=1&b=2");
    }

    #[test]
    fn parse_incomplete_request() {
        let result = Request::parse(b"GET / HTTP/1.1\r\nHost: localhost\r\n");
        assert!(matches!(result, Err(HttpError::ParseError { source: ParseError::Incomplete })));
    }
}
