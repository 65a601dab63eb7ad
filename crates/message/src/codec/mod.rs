//! Decoding of raw HTTP/1.x request heads into [`Request`](crate::protocol::Request) values.
//!
//! The decoder is a thin layer over `httparse`: the request line becomes the method, the
//! [`Uri`](crate::protocol::Uri) and the protocol version, and every header field is added to
//! the request's [`Headers`](crate::protocol::Headers) in order.
//!
//! # Example
//!
//! ```
//! use micro_message::codec::decode_head;
//! use micro_message::protocol::{HttpMessage, HttpRequest};
//!
//! let raw = b"GET /index.html?lang=en HTTP/1.1\r\nHost: localhost\r\n\r\nbody";
//! let (request, body_offset) = decode_head(raw).unwrap().unwrap();
//!
//! assert_eq!(request.method(), "GET");
//! assert_eq!(request.uri().path(), "/index.html");
//! assert_eq!(request.header_line("host"), "localhost");
//! assert_eq!(&raw[body_offset..], b"body");
//! ```

mod head_decoder;

pub use head_decoder::decode_head;
pub use head_decoder::MAX_HEADER_BYTES;
pub use head_decoder::MAX_HEADER_NUM;
