//! The common envelope of requests and responses.
//!
//! [`Message`] holds the protocol version, the headers and the body. The [`HttpMessage`]
//! trait exposes them with immutable-derivation semantics: every `with_*` method validates
//! its argument, clones the receiver, changes only the clone and returns it.

use crate::protocol::{Headers, IntoHeaderValues, MessageError, ProtocolVersion, Stream};

#[derive(Debug, Clone, Default)]
pub struct Message {
    version: ProtocolVersion,
    headers: Headers,
    body: Stream,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a message from already validated parts.
    pub fn from_parts(version: ProtocolVersion, headers: Headers, body: Stream) -> Self {
        Self { version, headers, body }
    }

    pub fn into_parts(self) -> (ProtocolVersion, Headers, Stream) {
        (self.version, self.headers, self.body)
    }

    pub(crate) fn set_version(&mut self, version: ProtocolVersion) {
        self.version = version;
    }

    pub(crate) fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub(crate) fn set_body(&mut self, body: Stream) {
        self.body = body;
    }
}

/// Read access and derivation for anything built around a [`Message`].
pub trait HttpMessage: Clone {
    fn message(&self) -> &Message;

    fn message_mut(&mut self) -> &mut Message;

    fn protocol_version(&self) -> ProtocolVersion {
        self.message().version
    }

    /// Returns a copy with the given protocol version; only `1.0`, `1.1` and `2.0` are accepted.
    fn with_protocol_version(&self, version: &str) -> Result<Self, MessageError> {
        let version = version.parse::<ProtocolVersion>()?;
        Ok(self.with_version(version))
    }

    #[must_use]
    fn with_version(&self, version: ProtocolVersion) -> Self {
        let mut derived = self.clone();
        derived.message_mut().set_version(version);
        derived
    }

    fn headers(&self) -> &Headers {
        &self.message().headers
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers().has(name)
    }

    fn header(&self, name: &str) -> &[String] {
        self.headers().get(name)
    }

    fn header_line(&self, name: &str) -> String {
        self.headers().get_line(name)
    }

    /// Returns a copy where `name` holds only `values`.
    fn with_header<V: IntoHeaderValues>(&self, name: &str, values: V) -> Result<Self, MessageError> {
        Headers::check_name(name)?;
        let mut derived = self.clone();
        derived.message_mut().headers_mut().set(name, values)?;
        Ok(derived)
    }

    /// Returns a copy where `values` are appended to the existing values of `name`.
    fn with_added_header<V: IntoHeaderValues>(&self, name: &str, values: V) -> Result<Self, MessageError> {
        Headers::check_name(name)?;
        let mut derived = self.clone();
        derived.message_mut().headers_mut().add(name, values)?;
        Ok(derived)
    }

    #[must_use]
    fn without_header(&self, name: &str) -> Self {
        let mut derived = self.clone();
        derived.message_mut().headers_mut().unset(name);
        derived
    }

    fn body(&self) -> &Stream {
        &self.message().body
    }

    #[must_use]
    fn with_body(&self, body: Stream) -> Self {
        let mut derived = self.clone();
        derived.message_mut().set_body(body);
        derived
    }
}

impl HttpMessage for Message {
    fn message(&self) -> &Message {
        self
    }

    fn message_mut(&mut self) -> &mut Message {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let message = Message::new();
        assert_eq!(message.protocol_version(), ProtocolVersion::Http11);
        assert!(message.headers().is_empty());
        assert_eq!(message.body().size(), Some(0));
        assert_eq!(message.body().to_string(), "");
    }

    #[test]
    fn with_protocol_version() {
        let message = Message::new();

        let derived = message.with_protocol_version("1.0").unwrap();
        assert_eq!(derived.protocol_version(), ProtocolVersion::Http10);
        assert_eq!(message.protocol_version(), ProtocolVersion::Http11);

        assert_eq!(message.with_protocol_version("2.0").unwrap().protocol_version(), ProtocolVersion::Http20);
        assert!(matches!(message.with_protocol_version("1.5"), Err(MessageError::InvalidArgument { .. })));
    }

    #[test]
    fn with_header_is_case_insensitive() {
        let message = Message::new().with_header("Content-Type", "application/json").unwrap();

        assert_eq!(message.header_line("content-type"), "application/json");
        assert!(message.has_header("CONTENT-TYPE"));
        assert_eq!(message.header("Content-type"), ["application/json"]);
    }

    #[test]
    fn header_derivation_leaves_receiver_untouched() {
        let message = Message::new().with_header("Accept", "text/html").unwrap();

        let replaced = message.with_header("accept", "application/json").unwrap();
        let added = message.with_added_header("ACCEPT", ["text/plain", "*/*"]).unwrap();
        let removed = message.without_header("Accept");

        assert_eq!(message.header("accept"), ["text/html"]);
        assert_eq!(replaced.header("accept"), ["application/json"]);
        assert_eq!(added.header_line("accept"), "text/html, text/plain, */*");
        assert!(!removed.has_header("accept"));
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let message = Message::new();
        assert!(matches!(message.with_header("X-Split\r\nEvil", "x"), Err(MessageError::InvalidArgument { .. })));
        assert!(matches!(message.with_added_header("a\nb", "x"), Err(MessageError::InvalidArgument { .. })));
        assert!(message.headers().is_empty());
    }

    #[test]
    fn with_body_replaces_the_stream() {
        let message = Message::new();
        let body = Stream::from_bytes("{\"id\":1}");

        let derived = message.with_body(body.clone());

        assert!(derived.body().same_resource(&body));
        assert!(!message.body().same_resource(&body));
        assert_eq!(derived.body().to_string(), "{\"id\":1}");
        assert_eq!(message.body().to_string(), "");
    }

    #[test]
    fn derived_messages_share_the_body() {
        let message = Message::new();
        let derived = message.with_header("X-Trace", "1").unwrap();

        message.body().write(b"payload").unwrap();
        assert_eq!(derived.body().to_string(), "payload");
    }

    #[test]
    fn into_parts() {
        let message = Message::new().with_version(ProtocolVersion::Http20).with_header("Host", "localhost").unwrap();
        let (version, headers, _body) = message.into_parts();

        assert_eq!(version, ProtocolVersion::Http20);
        assert_eq!(headers.get_line("host"), "localhost");
    }
}
