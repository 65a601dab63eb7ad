//! Immutable HTTP message value objects.
//!
//! Every value in this module is a plain value: accessors never change it, and every
//! `with_*` method validates its argument first and then returns a modified copy, leaving
//! the receiver as it was.
//!
//! # Components
//!
//! - **Uri** ([`Uri`]): parsed uri reference with per-component replacement
//! - **Query strings** ([`QueryCodec`]): permissive `key=value&...` (de)serialization
//! - **Headers** ([`Headers`]): case-insensitive, insertion-ordered multi-value map
//! - **Body** ([`Stream`]): shared handle over a readable/writable/seekable resource
//! - **Messages** ([`Message`], [`HttpMessage`]): version, headers and body
//! - **Requests** ([`Request`], [`HttpRequest`]): method, request target and uri
//!
//! Errors are reported through [`MessageError`], and [`ParseError`] when decoding raw
//! request heads; [`HttpError`] wraps both.
//!
//! # Example
//!
//! ```
//! use micro_message::protocol::{HttpMessage, HttpRequest, Request, Uri};
//!
//! let request = Request::new("GET", Uri::parse("http://example.com/items?x=1").unwrap());
//! let json = request.with_header("Accept", "application/json").unwrap();
//!
//! assert_eq!(json.header_line("accept"), "application/json");
//! assert!(!request.has_header("accept"));
//! assert_eq!(json.request_target(), "/items?x=1");
//! assert_eq!(json.header_line("host"), "example.com");
//! ```

mod error;
pub use error::HttpError;
pub use error::MessageError;
pub use error::ParseError;

pub mod percent;

mod query;
pub use query::QueryCodec;
pub use query::QueryMap;

mod version;
pub use version::ProtocolVersion;

mod uri;
pub use uri::Uri;

mod header;
pub use header::Headers;
pub use header::IntoHeaderValues;

mod stream;
pub use stream::OpenMode;
pub use stream::Resource;
pub use stream::Stream;
pub use stream::StreamMetadata;
pub use stream::StreamState;
pub use stream::Whence;

mod message;
pub use message::HttpMessage;
pub use message::Message;

mod request;
pub use request::HttpRequest;
pub use request::Request;
