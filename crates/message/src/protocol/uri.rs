//! Uri value object.
//!
//! A [`Uri`] is parsed once from its raw string and never changed afterwards. Every `with_*`
//! method validates its argument and then returns a new [`Uri`] with exactly that component
//! replaced.
//!
//! ```not_rust
//!   foo://user:pw@example.com:8042/over/there?name=ferret#nose
//!   \_/   \______________________/\_________/ \_________/ \__/
//!    |              |                  |           |        |
//! scheme        authority            path        query  fragment
//! ```
//!
//! # String form
//!
//! The [`Display`](fmt::Display) implementation returns the raw string exactly as it was
//! supplied to [`Uri::parse`]. Once a component is replaced the raw string no longer describes
//! the value, so derived uris are reassembled from their components instead.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::ensure;
use crate::protocol::percent::{self, Component};
use crate::protocol::{MessageError, QueryCodec, QueryMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uri {
    raw: Option<String>,
    scheme: String,
    user: String,
    password: Option<String>,
    host: String,
    port: Option<u16>,
    path: String,
    query: String,
    fragment: String,
}

impl Uri {
    /// An empty uri, its string form is `""`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a uri reference.
    ///
    /// Parsing is lenient: anything that is not recognized as scheme, authority, query or
    /// fragment ends up in the path. Only a malformed port is rejected.
    pub fn parse(raw: &str) -> Result<Self, MessageError> {
        let mut rest = raw;
        let fragment = split_off(&mut rest, '#');
        let query = split_off(&mut rest, '?');

        let mut scheme = "";
        if let Some(colon) = rest.find(':')
            && colon > 0
            && is_valid_scheme(&rest[..colon])
        {
            scheme = &rest[..colon];
            rest = &rest[colon + 1..];
        }

        let mut uri = Uri {
            raw: Some(raw.to_owned()),
            scheme: scheme.to_ascii_lowercase(),
            query: query.unwrap_or_default().to_owned(),
            fragment: fragment.unwrap_or_default().to_owned(),
            ..Uri::default()
        };

        if let Some(after_slashes) = rest.strip_prefix("//") {
            let end = after_slashes.find('/').unwrap_or(after_slashes.len());
            uri.parse_authority(&after_slashes[..end])?;
            rest = &after_slashes[end..];
        }

        uri.path = rest.to_owned();
        Ok(uri)
    }

    fn parse_authority(&mut self, authority: &str) -> Result<(), MessageError> {
        let host_port = match authority.rfind('@') {
            Some(at) => {
                let user_info = &authority[..at];
                match user_info.split_once(':') {
                    Some((user, password)) => {
                        self.user = user.to_owned();
                        self.password = Some(password.to_owned());
                    }
                    None => self.user = user_info.to_owned(),
                }
                &authority[at + 1..]
            }
            None => authority,
        };

        // ip literals carry colons of their own: `[::1]:8080`
        let port_start = match host_port.rfind(']') {
            Some(bracket) => host_port[bracket..].find(':').map(|colon| bracket + colon),
            None => host_port.rfind(':'),
        };

        let (host, port) = match port_start {
            Some(colon) => (&host_port[..colon], &host_port[colon + 1..]),
            None => (host_port, ""),
        };

        self.host = host.to_ascii_lowercase();
        if !port.is_empty() {
            ensure!(
                port.bytes().all(|b| b.is_ascii_digit()),
                MessageError::invalid_argument(format!("invalid port: {port}"))
            );
            let port = port.parse::<i64>().map_err(|e| MessageError::invalid_argument(format!("invalid port {port}: {e}")))?;
            self.port = Some(check_port(port)?);
        }

        Ok(())
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns `[user-info@]host[:port]`, omitting the parts that are absent.
    pub fn authority(&self) -> String {
        let user_info = self.user_info();
        let mut authority = String::with_capacity(user_info.len() + self.host.len() + 7);
        if !user_info.is_empty() {
            authority.push_str(&user_info);
            authority.push('@');
        }
        authority.push_str(&self.host);
        if let Some(port) = self.port {
            authority.push(':');
            authority.push_str(&port.to_string());
        }
        authority
    }

    /// Returns `user[:password]`, or an empty string when there is no user.
    pub fn user_info(&self) -> String {
        if self.user.is_empty() {
            return String::new();
        }

        let user = percent::encode(&self.user, Component::UserInfo);
        match &self.password {
            Some(password) => format!("{user}:{}", percent::encode(password, Component::UserInfo)),
            None => user.into_owned(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The percent-encoded path.
    pub fn path(&self) -> Cow<'_, str> {
        percent::encode(&self.path, Component::Path)
    }

    /// The percent-encoded query, without the leading `?`.
    pub fn query(&self) -> Cow<'_, str> {
        percent::encode(&self.query, Component::Query)
    }

    /// The query exactly as it was stored.
    pub fn raw_query(&self) -> &str {
        &self.query
    }

    /// The query with `%XX` escapes resolved.
    pub fn decoded_query(&self) -> Cow<'_, str> {
        percent::decode(&self.query)
    }

    /// The query deserialized with [`QueryCodec::deserialize`].
    pub fn query_params(&self) -> QueryMap {
        QueryCodec::deserialize(&self.query)
    }

    /// The percent-encoded fragment, without the leading `#`.
    pub fn fragment(&self) -> Cow<'_, str> {
        percent::encode(&self.fragment, Component::Fragment)
    }

    fn derive(&self, f: impl FnOnce(&mut Uri)) -> Uri {
        let mut uri = self.clone();
        uri.raw = None;
        f(&mut uri);
        uri
    }

    pub fn with_scheme(&self, scheme: &str) -> Result<Uri, MessageError> {
        ensure!(
            scheme.is_empty() || is_valid_scheme(scheme),
            MessageError::invalid_argument(format!("invalid scheme: {scheme}"))
        );
        Ok(self.derive(|uri| uri.scheme = scheme.to_ascii_lowercase()))
    }

    /// Replaces the user info; an empty `user` removes it.
    pub fn with_user_info(&self, user: &str, password: Option<&str>) -> Uri {
        self.derive(|uri| {
            uri.user = user.to_owned();
            uri.password = password.filter(|_| !user.is_empty()).map(str::to_owned);
        })
    }

    /// Replaces the host; a `:` is only accepted inside a bracketed ip literal such as `[::1]`.
    pub fn with_host(&self, host: &str) -> Result<Uri, MessageError> {
        ensure!(
            !host.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control() || matches!(b, b'/' | b'?' | b'#' | b'@')),
            MessageError::invalid_argument(format!("invalid host: {host}"))
        );
        let ip_literal = host.starts_with('[') && host.ends_with(']');
        ensure!(
            ip_literal || !host.contains(':'),
            MessageError::invalid_argument(format!("invalid host, a port belongs in with_port: {host}"))
        );
        Ok(self.derive(|uri| uri.host = host.to_ascii_lowercase()))
    }

    /// Replaces the port; fails unless `port` is within `0..=65535`.
    pub fn with_port(&self, port: i64) -> Result<Uri, MessageError> {
        let port = check_port(port)?;
        Ok(self.derive(|uri| uri.port = Some(port)))
    }

    pub fn without_port(&self) -> Uri {
        self.derive(|uri| uri.port = None)
    }

    /// Replaces the path.
    ///
    /// Characters that merely need encoding are accepted and encoded on output; a `?`, `#`,
    /// whitespace, a control character or a broken `%` escape is rejected.
    pub fn with_path(&self, path: &str) -> Result<Uri, MessageError> {
        ensure!(is_valid_path(path), MessageError::invalid_argument(format!("invalid path: {path:?}")));
        Ok(self.derive(|uri| uri.path = path.to_owned()))
    }

    pub fn with_query(&self, query: &str) -> Result<Uri, MessageError> {
        QueryCodec::validate(query)?;
        Ok(self.derive(|uri| uri.query = query.to_owned()))
    }

    pub fn with_fragment(&self, fragment: &str) -> Uri {
        self.derive(|uri| uri.fragment = fragment.to_owned())
    }
}

/// Takes everything after the first `delimiter` off `rest`.
fn split_off<'a>(rest: &mut &'a str, delimiter: char) -> Option<&'a str> {
    let (head, tail) = rest.split_once(delimiter)?;
    *rest = head;
    Some(tail)
}

fn check_port(port: i64) -> Result<u16, MessageError> {
    u16::try_from(port).map_err(|e| MessageError::invalid_argument(format!("port {port} is out of range 0-65535: {e}")))
}

/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
fn is_valid_scheme(scheme: &str) -> bool {
    let mut bytes = scheme.bytes();
    bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
}

fn is_valid_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.iter().enumerate().all(|(index, &b)| match b {
        b'?' | b'#' => false,
        b'%' => percent::is_escape(bytes, index),
        b => !(b.is_ascii_whitespace() || b.is_ascii_control()),
    })
}

impl FromStr for Uri {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uri::parse(s)
    }
}

impl TryFrom<&str> for Uri {
    type Error = MessageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Uri::parse(value)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw) = &self.raw {
            return f.write_str(raw);
        }

        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }

        let authority = self.authority();
        if !authority.is_empty() {
            write!(f, "//{authority}")?;
        }

        let path = self.path();
        if !authority.is_empty() && !path.is_empty() && !path.starts_with('/') {
            f.write_str("/")?;
            f.write_str(&path)?;
        } else if authority.is_empty() && path.starts_with("//") {
            // without an authority a leading `//` would be read back as one
            f.write_str("/")?;
            f.write_str(path.trim_start_matches('/'))?;
        } else {
            f.write_str(&path)?;
        }

        if !self.query.is_empty() {
            write!(f, "?{}", self.query())?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment())?;
        }
        Ok(())
    }
}
