use std::fmt;
use std::str::FromStr;

use crate::protocol::MessageError;

/// The protocol versions a message may carry.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    Http10,
    #[default]
    Http11,
    Http20,
}

impl ProtocolVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::Http10 => "1.0",
            ProtocolVersion::Http11 => "1.1",
            ProtocolVersion::Http20 => "2.0",
        }
    }

    /// Parses a server protocol string such as `HTTP/1.1`.
    ///
    /// Servers report HTTP/2 as `HTTP/2`, which is read as `2.0`.
    pub fn from_server_protocol(protocol: &str) -> Result<Self, MessageError> {
        let version = protocol
            .strip_prefix("HTTP/")
            .ok_or_else(|| MessageError::invalid_argument(format!("invalid server protocol: {protocol}")))?;
        match version {
            "2" => Ok(ProtocolVersion::Http20),
            version => version.parse(),
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0" => Ok(ProtocolVersion::Http10),
            "1.1" => Ok(ProtocolVersion::Http11),
            "2.0" => Ok(ProtocolVersion::Http20),
            _ => Err(MessageError::invalid_argument(format!("invalid or unsupported http version: {s}"))),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ProtocolVersion> for http::Version {
    fn from(version: ProtocolVersion) -> Self {
        match version {
            ProtocolVersion::Http10 => http::Version::HTTP_10,
            ProtocolVersion::Http11 => http::Version::HTTP_11,
            ProtocolVersion::Http20 => http::Version::HTTP_2,
        }
    }
}

impl TryFrom<http::Version> for ProtocolVersion {
    type Error = MessageError;

    fn try_from(version: http::Version) -> Result<Self, Self::Error> {
        if version == http::Version::HTTP_10 {
            Ok(ProtocolVersion::Http10)
        } else if version == http::Version::HTTP_11 {
            Ok(ProtocolVersion::Http11)
        } else if version == http::Version::HTTP_2 {
            Ok(ProtocolVersion::Http20)
        } else {
            Err(MessageError::invalid_argument(format!("unsupported http version: {version:?}")))
        }
    }
}
