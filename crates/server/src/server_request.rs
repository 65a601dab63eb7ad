//! Server-side requests built from an [`Environment`] snapshot.
//!
//! [`ServerRequest::from_environment`] walks the snapshot once and hands every entry to
//! [`ServerRequest::assign`], which knows a fixed set of keys:
//!
//! | key | becomes |
//! |---|---|
//! | `REQUEST_METHOD` | the method |
//! | `REQUEST_URI` | the uri |
//! | `SERVER_PROTOCOL` | the protocol version |
//! | `QUERY_STRING` | the uri query, if `REQUEST_URI` carried none |
//! | `HTTP_*`, `CONTENT_TYPE`, `CONTENT_LENGTH` | headers, `HTTP_X_FORWARDED_FOR` as `X-Forwarded-For` |
//! | `HTTP_COOKIE` | the `Cookie` header and the cookie params |
//! | `SCRIPT_NAME`, `SERVER_NAME`, `SERVER_PORT`, `REMOTE_ADDR`, `REQUEST_TIME*` | [`ServerInfo`] |
//!
//! Unknown keys are skipped. Afterwards the [`FieldBuckets`] for the request method are
//! collected from a [`ServerFields`] provider.

use indexmap::IndexMap;
use micro_message::prelude::*;
use micro_message::protocol::{Message, MessageError, ProtocolVersion, QueryCodec, QueryMap, Request, Uri};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::environment::{self, Environment};
use crate::fields::{FieldBuckets, ServerFields, UploadedFile};
use crate::RequestError;

/// Cookie name to value.
pub type CookieMap = IndexMap<String, String>;

/// Facts about the server and the connection that are not part of the HTTP message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerInfo {
    pub script_name: String,
    pub server_name: String,
    pub server_port: Option<u16>,
    pub remote_addr: String,
    /// Seconds since the unix epoch.
    pub request_time: Option<u64>,
    pub request_time_float: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ServerRequest {
    request: Request,
    cookies: CookieMap,
    server_params: Environment,
    info: ServerInfo,
    fields: FieldBuckets,
    query_params: Option<QueryMap>,
    query_string: Option<String>,
}

impl ServerRequest {
    /// Builds a request from `environment`, collecting field buckets from `fields`.
    ///
    /// Fails with [`RequestError::UnsupportedMethod`] unless the method is `GET` or `POST`.
    pub fn from_environment<F: ServerFields + ?Sized>(environment: &Environment, fields: &F) -> Result<Self, RequestError> {
        let mut server_request = ServerRequest {
            request: Request::default(),
            cookies: CookieMap::new(),
            server_params: environment.clone(),
            info: ServerInfo::default(),
            fields: FieldBuckets::default(),
            query_params: None,
            query_string: None,
        };

        for (key, value) in environment.iter() {
            if !server_request.assign(key, value)? {
                trace!(key, "skipped unknown environment variable");
            }
        }
        server_request.apply_query_string()?;

        server_request.fields = FieldBuckets::collect(server_request.method(), fields)?;
        debug!(
            method = server_request.method(),
            target = %server_request.request_target(),
            files = server_request.fields.files.len(),
            "built server request from environment"
        );
        Ok(server_request)
    }

    /// Assigns one environment variable; returns `false` if `key` is not recognized.
    pub fn assign(&mut self, key: &str, value: &str) -> Result<bool, RequestError> {
        match key {
            environment::SCRIPT_NAME => self.info.script_name = value.to_owned(),
            environment::REQUEST_METHOD => self.request = self.request.with_method(value),
            environment::REQUEST_URI => self.request = self.request.with_uri(Uri::parse(value)?, true),
            environment::SERVER_PROTOCOL => {
                self.request = self.request.with_version(ProtocolVersion::from_server_protocol(value)?);
            }
            environment::QUERY_STRING => self.query_string = Some(value.to_owned()),
            environment::SERVER_NAME => self.info.server_name = value.to_owned(),
            environment::SERVER_PORT => self.info.server_port = parse_optional(key, value)?,
            environment::REMOTE_ADDR => self.info.remote_addr = value.to_owned(),
            environment::REQUEST_TIME => self.info.request_time = parse_optional(key, value)?,
            environment::REQUEST_TIME_FLOAT => self.info.request_time_float = parse_optional(key, value)?,
            environment::HTTP_COOKIE => {
                self.cookies = parse_cookies(value);
                self.set_header("Cookie", value)?;
            }
            environment::HTTP_HOST => self.set_header("Host", value)?,
            environment::HTTP_ACCEPT => self.set_header("Accept", value)?,
            environment::HTTP_ACCEPT_LANGUAGE => self.set_header("Accept-Language", value)?,
            environment::HTTP_ACCEPT_CHARSET => self.set_header("Accept-Charset", value)?,
            environment::HTTP_USER_AGENT => self.set_header("User-Agent", value)?,
            environment::CONTENT_TYPE => self.set_header("Content-Type", value)?,
            environment::CONTENT_LENGTH => self.set_header("Content-Length", value)?,
            _ => match header_name(key) {
                Some(name) => self.set_header(&name, value)?,
                None => return Ok(false),
            },
        }
        Ok(true)
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), MessageError> {
        if !value.is_empty() {
            self.request = self.request.with_header(name, value)?;
        }
        Ok(())
    }

    fn apply_query_string(&mut self) -> Result<(), MessageError> {
        if let Some(query_string) = self.query_string.as_deref()
            && !query_string.is_empty()
            && self.request.uri().raw_query().is_empty()
        {
            let uri = self.request.uri().with_query(query_string)?;
            self.request = self.request.with_uri(uri, true);
        }
        Ok(())
    }

    pub fn server_params(&self) -> &Environment {
        &self.server_params
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn cookie_params(&self) -> &CookieMap {
        &self.cookies
    }

    /// Returns a copy with `cookies` set over the current cookies.
    #[must_use]
    pub fn with_cookie_params(&self, cookies: CookieMap) -> Self {
        let mut server_request = self.clone();
        server_request.cookies.extend(cookies);
        server_request
    }

    /// Returns the query params set with [`ServerRequest::with_query_params`], or else the
    /// params of the uri's raw query.
    pub fn query_params(&self) -> QueryMap {
        match &self.query_params {
            Some(params) => params.clone(),
            None => QueryCodec::deserialize(self.uri().raw_query()),
        }
    }

    /// Returns a copy with overridden query params; the uri is left as it is.
    #[must_use]
    pub fn with_query_params(&self, params: QueryMap) -> Self {
        Self { query_params: Some(params), ..self.clone() }
    }

    /// Deserializes the uri's query into `T`, including nested `a[b]=c` keys.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        serde_qs::from_str::<T>(self.uri().raw_query()).map_err(RequestError::invalid_query)
    }

    pub fn fields(&self) -> &FieldBuckets {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get.get(name).map(String::as_str)
    }

    pub fn post(&self, name: &str) -> Option<&str> {
        self.fields.post.get(name).map(String::as_str)
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.fields.files.get(name)
    }
}

impl HttpMessage for ServerRequest {
    fn message(&self) -> &Message {
        self.request.message()
    }

    fn message_mut(&mut self) -> &mut Message {
        self.request.message_mut()
    }
}

impl HttpRequest for ServerRequest {
    fn request(&self) -> &Request {
        &self.request
    }

    fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }
}

fn parse_optional<T>(key: &str, value: &str) -> Result<Option<T>, MessageError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<T>()
        .map(Some)
        .map_err(|e| MessageError::invalid_argument(format!("invalid {key}: {value}: {e}")))
}

/// Derives the header name of an `HTTP_*` variable: `HTTP_X_FORWARDED_FOR` is `X-Forwarded-For`.
fn header_name(key: &str) -> Option<String> {
    let name = key.strip_prefix("HTTP_").filter(|name| !name.is_empty())?;
    let words: Vec<String> = name
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect();
    Some(words.join("-"))
}

/// Parses a `Cookie` header value: `name=value` pairs separated by `;`.
fn parse_cookies(header: &str) -> CookieMap {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_owned(), value.trim().to_owned()))
        })
        .collect()
}
