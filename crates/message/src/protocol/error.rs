use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("message error: {source}")]
    MessageError {
        #[from]
        source: MessageError,
    },

    #[error("parse error: {source}")]
    ParseError {
        #[from]
        source: ParseError,
    },
}

/// Errors raised by the message value objects and their body streams.
#[derive(Error, Debug)]
pub enum MessageError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("stream is not seekable")]
    NotSeekable,

    #[error("stream is not readable")]
    NotReadable,

    #[error("stream is not writable")]
    NotWritable,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl MessageError {
    pub fn invalid_argument<S: ToString>(str: S) -> Self {
        Self::InvalidArgument { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// An io error that has no underlying os error, e.g. a detached resource.
    pub(crate) fn io_other<S: ToString>(str: S) -> Self {
        Self::Io { source: io::Error::other(str.to_string()) }
    }
}

/// Errors raised while decoding a raw HTTP/1.x request head.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http uri: {reason}")]
    InvalidUri { reason: String },

    #[error("incomplete request head")]
    Incomplete,
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_uri<S: ToString>(str: S) -> Self {
        Self::InvalidUri { reason: str.to_string() }
    }
}
