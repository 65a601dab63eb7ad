//! Server-side HTTP requests
//!
//! A [`ServerRequest`] is a [`Request`](micro_message::protocol::Request) populated from the
//! variables a CGI-style server hands to a script, plus the parts only a server knows
//! about: cookies, the submitted fields and facts about the connection.
//!
//! The ambient state is never read implicitly. It arrives as two explicit collaborators:
//!
//! - [`Environment`]: a snapshot of `REQUEST_METHOD`, `REQUEST_URI`, `HTTP_*` and friends
//! - [`ServerFields`]: access to query fields, form fields and uploaded files
//!
//! # Example
//!
//! ```
//! use micro_message::prelude::*;
//! use micro_server_request::{Environment, FormFields, ServerRequest};
//!
//! let environment = Environment::mock([("REQUEST_METHOD", "GET"), ("REQUEST_URI", "/items?x=1&y=2")]);
//! let fields = FormFields::from_query("x=1&y=2").unwrap();
//!
//! let request = ServerRequest::from_environment(&environment, &fields).unwrap();
//!
//! assert_eq!(request.method(), "GET");
//! assert_eq!(request.request_target(), "/items?x=1&y=2");
//! assert_eq!(request.query_params()["y"], "2");
//! assert_eq!(request.get("x"), Some("1"));
//! ```

pub mod environment;
pub use environment::Environment;

mod error;
pub use error::RequestError;

mod fields;
pub use fields::FieldBuckets;
pub use fields::FieldMap;
pub use fields::FileMap;
pub use fields::FormFields;
pub use fields::ServerFields;
pub use fields::UploadedFile;

mod server_request;
pub use server_request::CookieMap;
pub use server_request::ServerInfo;
pub use server_request::ServerRequest;
