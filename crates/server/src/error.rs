use micro_message::protocol::MessageError;
use thiserror::Error;

/// Errors raised while building or reading a server request.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("unsupported request method: {method}")]
    UnsupportedMethod { method: String },

    #[error("message error: {source}")]
    Message {
        #[from]
        source: MessageError,
    },

    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },
}

impl RequestError {
    pub fn unsupported_method<S: ToString>(method: S) -> Self {
        Self::UnsupportedMethod { method: method.to_string() }
    }

    pub fn invalid_query<S: ToString>(str: S) -> Self {
        Self::InvalidQuery { reason: str.to_string() }
    }
}
