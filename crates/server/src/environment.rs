//! Snapshot of the CGI-style variables a server request is built from.
//!
//! An [`Environment`] is an ordered `key -> value` map. It never reads process state on its
//! own: [`Environment::from_process_env`] is the only constructor that looks at the current
//! process, and it copies what it needs once.

use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use tracing::trace;

pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
pub const SCRIPT_NAME: &str = "SCRIPT_NAME";
pub const REQUEST_URI: &str = "REQUEST_URI";
pub const QUERY_STRING: &str = "QUERY_STRING";
pub const SERVER_NAME: &str = "SERVER_NAME";
pub const SERVER_PORT: &str = "SERVER_PORT";
pub const HTTP_HOST: &str = "HTTP_HOST";
pub const HTTP_ACCEPT: &str = "HTTP_ACCEPT";
pub const HTTP_ACCEPT_LANGUAGE: &str = "HTTP_ACCEPT_LANGUAGE";
pub const HTTP_ACCEPT_CHARSET: &str = "HTTP_ACCEPT_CHARSET";
pub const HTTP_USER_AGENT: &str = "HTTP_USER_AGENT";
pub const HTTP_COOKIE: &str = "HTTP_COOKIE";
pub const REMOTE_ADDR: &str = "REMOTE_ADDR";
pub const REQUEST_TIME: &str = "REQUEST_TIME";
pub const REQUEST_TIME_FLOAT: &str = "REQUEST_TIME_FLOAT";
pub const CONTENT_TYPE: &str = "CONTENT_TYPE";
pub const CONTENT_LENGTH: &str = "CONTENT_LENGTH";

/// Every key a server request knows how to assign.
pub const KNOWN_KEYS: [&str; 18] = [
    SERVER_PROTOCOL,
    REQUEST_METHOD,
    SCRIPT_NAME,
    REQUEST_URI,
    QUERY_STRING,
    SERVER_NAME,
    SERVER_PORT,
    HTTP_HOST,
    HTTP_ACCEPT,
    HTTP_ACCEPT_LANGUAGE,
    HTTP_ACCEPT_CHARSET,
    HTTP_USER_AGENT,
    HTTP_COOKIE,
    REMOTE_ADDR,
    REQUEST_TIME,
    REQUEST_TIME_FLOAT,
    CONTENT_TYPE,
    CONTENT_LENGTH,
];

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    vars: IndexMap<String, String>,
}

impl Environment {
    /// The default snapshot, with the request time set to now.
    pub fn new() -> Self {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();

        let defaults = [
            (SERVER_PROTOCOL, "HTTP/1.1".to_owned()),
            (REQUEST_METHOD, "GET".to_owned()),
            (SCRIPT_NAME, String::new()),
            (REQUEST_URI, String::new()),
            (QUERY_STRING, String::new()),
            (SERVER_NAME, "localhost".to_owned()),
            (SERVER_PORT, "8000".to_owned()),
            (HTTP_ACCEPT_LANGUAGE, "en-US,en;q=0.8".to_owned()),
            (HTTP_ACCEPT_CHARSET, "ISO-8859-1,utf-8;q=0.7,*;q=0.3".to_owned()),
            (REMOTE_ADDR, "127.0.0.1".to_owned()),
            (REQUEST_TIME, now.as_secs().to_string()),
            (REQUEST_TIME_FLOAT, format!("{:.6}", now.as_secs_f64())),
        ];

        Self { vars: defaults.into_iter().map(|(key, value)| (key.to_owned(), value)).collect() }
    }

    /// A snapshot for tests: the defaults plus a typical browser's host, accept and user
    /// agent headers, overridden by `overrides`.
    pub fn mock<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut environment = Self::new();
        environment.set(HTTP_HOST, "localhost");
        environment.set(HTTP_ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8");
        environment.set(HTTP_USER_AGENT, "micro-message");
        environment.extend(overrides);
        environment
    }

    /// The defaults overridden by `vars`.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut environment = Self::new();
        environment.extend(vars);
        environment
    }

    /// The defaults overridden by the CGI variables of the current process.
    ///
    /// Only known keys and `HTTP_*` variables are copied.
    pub fn from_process_env() -> Self {
        let vars = std::env::vars().filter(|(key, _)| {
            let wanted = KNOWN_KEYS.contains(&key.as_str()) || key.starts_with("HTTP_");
            if !wanted {
                trace!(key = %key, "skipped process variable");
            }
            wanted
        });
        Self::from_vars(vars)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Returns a copy where `key` holds `value`.
    #[must_use]
    pub fn with(&self, key: &str, value: &str) -> Self {
        let mut environment = self.clone();
        environment.set(key, value);
        environment
    }

    /// Returns a copy without `key`.
    #[must_use]
    pub fn without(&self, key: &str) -> Self {
        let mut environment = self.clone();
        environment.vars.shift_remove(key);
        environment
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterates over the variables in insertion order; overridden defaults keep their place.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_owned(), value.to_owned());
    }

    fn extend<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.extend(vars.into_iter().map(|(key, value)| (key.into(), value.into())));
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
