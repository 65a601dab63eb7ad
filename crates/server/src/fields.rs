//! Submitted request fields: query fields, form fields and uploaded files.
//!
//! A server request does not read submitted data itself. It asks a [`ServerFields`]
//! provider for the buckets that apply to its method and keeps them as [`FieldBuckets`].

use std::path::PathBuf;

use indexmap::IndexMap;
use mime::Mime;
use micro_message::prelude::*;
use micro_message::protocol::{MessageError, QueryCodec, Stream};
use tracing::debug;

use crate::RequestError;

/// Field name to value, in submission order.
pub type FieldMap = IndexMap<String, String>;

/// Field name to uploaded file, in submission order.
pub type FileMap = IndexMap<String, UploadedFile>;

/// A file received as part of a request, already stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The file name the client sent.
    pub client_name: String,
    pub media_type: Option<Mime>,
    pub size: u64,
    pub path: PathBuf,
}

impl UploadedFile {
    pub fn new(client_name: impl Into<String>, path: impl Into<PathBuf>, size: u64) -> Self {
        Self { client_name: client_name.into(), media_type: None, size, path: path.into() }
    }

    #[must_use]
    pub fn with_media_type(self, media_type: Mime) -> Self {
        Self { media_type: Some(media_type), ..self }
    }

    /// Opens the stored file as a read-only body stream.
    pub fn open(&self) -> Result<Stream, MessageError> {
        Ok(Stream::open(&self.path, "r")?.with_size(self.size))
    }
}

/// Access to the fields submitted with the current request.
#[cfg_attr(test, mockall::automock)]
pub trait ServerFields {
    /// A query field.
    fn get(&self, name: &str) -> Option<String>;

    /// A form field from the request body.
    fn post(&self, name: &str) -> Option<String>;

    fn file(&self, name: &str) -> Option<UploadedFile>;

    fn gets(&self) -> FieldMap;

    fn posts(&self) -> FieldMap;

    fn files(&self) -> FileMap;
}

/// [`ServerFields`] backed by a decoded query string, a decoded
/// `application/x-www-form-urlencoded` body and explicitly registered files.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    query: FieldMap,
    form: FieldMap,
    files: FileMap,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the query fields from a raw query string.
    pub fn from_query(query: &str) -> Result<Self, MessageError> {
        Ok(Self { query: QueryCodec::decode_form(query)?, ..Self::default() })
    }

    /// Collects the query fields and, for form bodies, the form fields of `request`.
    pub fn from_request<R: HttpRequest>(request: &R) -> Result<Self, MessageError> {
        let fields = Self::from_query(request.uri().raw_query())?;
        let content_type = request.header_line("content-type");
        if content_type.is_empty() {
            return Ok(fields);
        }

        let body = request.body();
        if body.is_seekable() {
            body.rewind()?;
        }
        fields.with_form_body(&content_type, &body.contents()?)
    }

    /// Decodes `body` as form fields if `content_type` is `application/x-www-form-urlencoded`.
    ///
    /// Bodies of any other media type are left alone.
    pub fn with_form_body(self, content_type: &str, body: &[u8]) -> Result<Self, MessageError> {
        let media_type = content_type
            .parse::<Mime>()
            .map_err(|e| MessageError::invalid_argument(format!("invalid content type {content_type}: {e}")))?;

        if media_type.essence_str() != mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            debug!(content_type = %media_type, "body is not a form, skipped");
            return Ok(self);
        }

        let body = std::str::from_utf8(body).map_err(|e| MessageError::invalid_argument(format!("form body is not utf-8: {e}")))?;
        Ok(Self { form: QueryCodec::decode_form(body)?, ..self })
    }

    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(name.into(), file);
        self
    }
}

impl ServerFields for FormFields {
    fn get(&self, name: &str) -> Option<String> {
        self.query.get(name).cloned()
    }

    fn post(&self, name: &str) -> Option<String> {
        self.form.get(name).cloned()
    }

    fn file(&self, name: &str) -> Option<UploadedFile> {
        self.files.get(name).cloned()
    }

    fn gets(&self) -> FieldMap {
        self.query.clone()
    }

    fn posts(&self) -> FieldMap {
        self.form.clone()
    }

    fn files(&self) -> FileMap {
        self.files.clone()
    }
}

/// The fields a request captured, grouped by the method that submitted them.
///
/// `files` is always filled; `get` only for `GET` requests and `post` only for `POST` requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldBuckets {
    pub get: FieldMap,
    pub post: FieldMap,
    pub files: FileMap,
}

impl FieldBuckets {
    /// Fills the buckets that apply to `method`; any method but `GET` and `POST` is rejected.
    pub fn collect<F: ServerFields + ?Sized>(method: &str, fields: &F) -> Result<Self, RequestError> {
        let mut buckets = FieldBuckets { files: fields.files(), ..FieldBuckets::default() };
        match method {
            "GET" => buckets.get = fields.gets(),
            "POST" => buckets.post = fields.posts(),
            _ => return Err(RequestError::unsupported_method(method)),
        }
        Ok(buckets)
    }
}
