//! Immutable HTTP message model
//!
//! This crate models HTTP requests as value objects: a [`Uri`](protocol::Uri), a
//! case-insensitive [`Headers`](protocol::Headers) collection and a body
//! [`Stream`](protocol::Stream), combined into [`Message`](protocol::Message) and
//! [`Request`](protocol::Request). Nothing is mutated in place: every `with_*` method returns
//! a derived copy and leaves the receiver untouched.
//!
//! # Example
//!
//! ```
//! use micro_message::prelude::*;
//! use micro_message::protocol::{Request, Stream, Uri};
//!
//! let uri = Uri::parse("https://example.com/search?q=rust").unwrap();
//! let request = Request::new("POST", uri)
//!     .with_header("Content-Type", "application/json")
//!     .unwrap()
//!     .with_body(Stream::from_bytes(r#"{"page":1}"#));
//!
//! assert_eq!(request.header_line("host"), "example.com");
//! assert_eq!(request.uri().query_params()["q"], "rust");
//! assert_eq!(request.body().to_string(), r#"{"page":1}"#);
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: the value objects, their traits and errors
//! - [`codec`]: decoding of raw HTTP/1.x request heads
//!
//! # Body sharing
//!
//! A [`Stream`](protocol::Stream) is a handle. Copies derived from one message share the same
//! body, including its position and whether it was closed or detached.
//!
//! # Limitations
//!
//! - No transport: messages are built from bytes or snapshots that were already received
//! - Maximum header size when decoding: 8KB
//! - Maximum number of headers when decoding: 64

pub mod codec;
pub mod protocol;

pub mod prelude {
    pub use crate::protocol::HttpMessage;
    pub use crate::protocol::HttpRequest;
}

mod utils;
pub(crate) use utils::ensure;
