//! Body stream implementation.
//!
//! A [`Stream`] wraps one readable/writable/seekable [`Resource`] and guards every operation
//! with capability flags that are derived once, when the stream is created, from an
//! fopen-style open mode (`r`, `r+`, `w`, `w+`, `a`, `a+`, `x`, `x+`, `c`, `c+`).
//!
//! # Lifecycle
//!
//! ```not_rust
//!            detach()
//!   Open ───────────────▶ Detached   (resource handed back to the caller)
//!     │
//!     │      close()
//!     └─────────────────▶ Closed     (resource dropped)
//! ```
//!
//! Both terminal states clear every capability flag, so reads, writes and seeks fail
//! afterwards. Dropping the last handle of an open stream closes its resource.
//!
//! # Sharing
//!
//! `Stream` is a handle: cloning it does not copy the resource. Messages derived from one
//! another hold clones of the same handle and therefore share the position and the state of
//! the underlying resource.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::mem;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::ensure;
use crate::protocol::MessageError;

/// A byte source a [`Stream`] can be bound to.
pub trait Resource: Read + Write + Seek + Send + fmt::Debug {
    /// Returns the current size of the resource, like `fstat` would.
    fn size(&self) -> io::Result<u64>;

    /// Whether the resource supports random access.
    fn is_seekable(&self) -> bool {
        true
    }
}

impl Resource for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

impl Resource for Cursor<Vec<u8>> {
    fn size(&self) -> io::Result<u64> {
        Ok(self.get_ref().len() as u64)
    }
}

/// Reference point of a [`Stream::seek`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Whence {
    #[default]
    Start,
    Current,
    End,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamState {
    Open,
    Detached,
    Closed,
}

/// Introspection data of a stream, see [`Stream::metadata`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMetadata {
    pub mode: String,
    pub readable: bool,
    pub writable: bool,
    pub seekable: bool,
    pub state: StreamState,
}

/// A parsed fopen-style open mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OpenMode {
    kind: u8,
    plus: bool,
}

impl OpenMode {
    pub fn is_readable(&self) -> bool {
        self.kind == b'r' || self.plus
    }

    pub fn is_writable(&self) -> bool {
        self.kind != b'r' || self.plus
    }

    pub fn is_append(&self) -> bool {
        self.kind == b'a'
    }

    /// The `OpenOptions` a file must be opened with to honor this mode.
    pub fn open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(self.is_readable()).write(self.is_writable());
        match self.kind {
            b'w' => options.create(true).truncate(true),
            b'a' => options.create(true).append(true),
            b'x' => options.create_new(true),
            b'c' => options.create(true),
            _ => &mut options,
        };
        options
    }
}

impl FromStr for OpenMode {
    type Err = MessageError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        let invalid = || MessageError::invalid_argument(format!("invalid stream mode: {mode:?}"));

        let mut bytes = mode.bytes();
        let kind = bytes.next().filter(|b| matches!(b, b'r' | b'w' | b'a' | b'x' | b'c')).ok_or_else(invalid)?;

        let mut plus = false;
        for flag in bytes {
            match flag {
                b'+' if !plus => plus = true,
                b'b' | b't' => {}
                _ => return Err(invalid()),
            }
        }

        Ok(OpenMode { kind, plus })
    }
}

enum State {
    Open(Box<dyn Resource>),
    Detached,
    Closed,
}

struct Inner {
    state: State,
    mode: String,
    readable: bool,
    writable: bool,
    seekable: bool,
    append: bool,
    size: Option<u64>,
    eof: bool,
}

#[derive(Clone)]
pub struct Stream {
    inner: Arc<Mutex<Inner>>,
}

impl Stream {
    /// Binds `resource` with the capabilities described by `mode`.
    pub fn new<R: Resource + 'static>(resource: R, mode: &str) -> Result<Stream, MessageError> {
        let open_mode = mode.parse::<OpenMode>()?;
        Ok(Self::bind(Box::new(resource), mode, open_mode))
    }

    /// An empty, readable and writable in-memory stream.
    pub fn memory() -> Stream {
        Self::from_bytes(Vec::new())
    }

    /// A readable and writable in-memory stream holding `bytes`, positioned at the start.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Stream {
        let mode = OpenMode { kind: b'r', plus: true };
        Self::bind(Box::new(Cursor::new(bytes.into())), "r+", mode)
    }

    /// Opens the file at `path` with the given fopen-style `mode`.
    pub fn open(path: impl AsRef<Path>, mode: &str) -> Result<Stream, MessageError> {
        let open_mode = mode.parse::<OpenMode>()?;
        let file = open_mode.open_options().open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), mode, "opened file stream");
        Ok(Self::bind(Box::new(file), mode, open_mode))
    }

    fn bind(resource: Box<dyn Resource>, mode: &str, open_mode: OpenMode) -> Stream {
        let seekable = resource.is_seekable();
        let inner = Inner {
            state: State::Open(resource),
            mode: mode.to_owned(),
            readable: open_mode.is_readable(),
            writable: open_mode.is_writable(),
            seekable,
            append: open_mode.is_append(),
            size: None,
            eof: false,
        };
        Stream { inner: Arc::new(Mutex::new(inner)) }
    }

    /// Overrides the size reported until the next write.
    #[must_use]
    pub fn with_size(self, size: u64) -> Stream {
        self.lock().size = Some(size);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true if both handles are bound to the same underlying resource.
    pub fn same_resource(&self, other: &Stream) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_readable(&self) -> bool {
        self.lock().readable
    }

    pub fn is_writable(&self) -> bool {
        self.lock().writable
    }

    pub fn is_seekable(&self) -> bool {
        self.lock().seekable
    }

    pub fn state(&self) -> StreamState {
        self.lock().state()
    }

    /// Reads up to `length` bytes; fewer are returned at the end of the stream.
    pub fn read(&self, length: usize) -> Result<Bytes, MessageError> {
        self.lock().read(length)
    }

    /// Writes all of `bytes`, returning how many were written.
    pub fn write(&self, bytes: &[u8]) -> Result<usize, MessageError> {
        self.lock().write(bytes)
    }

    pub fn seek(&self, offset: i64, whence: Whence) -> Result<(), MessageError> {
        self.lock().seek(offset, whence)
    }

    pub fn rewind(&self) -> Result<(), MessageError> {
        self.seek(0, Whence::Start)
    }

    /// Returns the current position.
    pub fn tell(&self) -> Result<u64, MessageError> {
        self.lock().tell()
    }

    /// Returns true if the stream is unbound or positioned at the end of its data.
    pub fn eof(&self) -> bool {
        self.lock().eof()
    }

    /// Returns the size if it is known or can be determined, `None` otherwise.
    pub fn size(&self) -> Option<u64> {
        self.lock().size()
    }

    /// Reads everything from the current position to the end.
    pub fn contents(&self) -> Result<Bytes, MessageError> {
        self.lock().contents()
    }

    pub fn metadata(&self) -> StreamMetadata {
        let inner = self.lock();
        StreamMetadata {
            mode: inner.mode.clone(),
            readable: inner.readable,
            writable: inner.writable,
            seekable: inner.seekable,
            state: inner.state(),
        }
    }

    /// Closes the stream and drops the underlying resource. Does nothing if already unbound.
    pub fn close(&self) {
        let mut inner = self.lock();
        if let State::Open(_) = inner.state {
            inner.state = State::Closed;
            inner.unbind();
            trace!(mode = %inner.mode, "closed stream");
        }
    }

    /// Separates the underlying resource from the stream and hands it to the caller.
    ///
    /// Returns `None` if the stream has already been detached or closed.
    pub fn detach(&self) -> Option<Box<dyn Resource>> {
        let mut inner = self.lock();
        match mem::replace(&mut inner.state, State::Detached) {
            State::Open(resource) => {
                inner.unbind();
                trace!(mode = %inner.mode, "detached stream");
                Some(resource)
            }
            previous => {
                inner.state = previous;
                None
            }
        }
    }
}

impl Inner {
    fn state(&self) -> StreamState {
        match self.state {
            State::Open(_) => StreamState::Open,
            State::Detached => StreamState::Detached,
            State::Closed => StreamState::Closed,
        }
    }

    fn unbind(&mut self) {
        self.readable = false;
        self.writable = false;
        self.seekable = false;
        self.size = None;
    }

    fn resource(&mut self) -> Result<&mut Box<dyn Resource>, MessageError> {
        match &mut self.state {
            State::Open(resource) => Ok(resource),
            State::Detached => Err(MessageError::io_other("stream is detached")),
            State::Closed => Err(MessageError::io_other("stream is closed")),
        }
    }

    fn read(&mut self, length: usize) -> Result<Bytes, MessageError> {
        ensure!(self.readable, MessageError::NotReadable);

        let mut buf = Vec::with_capacity(length.min(8 * 1024));
        let resource = self.resource()?;
        let read = Read::take(&mut **resource, length as u64).read_to_end(&mut buf)?;
        self.eof = read < length;
        Ok(Bytes::from(buf))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, MessageError> {
        ensure!(self.writable, MessageError::NotWritable);

        let append = self.append && self.seekable;
        let resource = self.resource()?;
        if append {
            resource.seek(SeekFrom::End(0))?;
        }
        resource.write_all(bytes)?;
        resource.flush()?;

        self.size = None;
        Ok(bytes.len())
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<(), MessageError> {
        ensure!(self.seekable, MessageError::NotSeekable);

        let position = match whence {
            Whence::Start => SeekFrom::Start(
                u64::try_from(offset).map_err(|e| {
                    MessageError::io(io::Error::new(io::ErrorKind::InvalidInput, format!("negative seek position {offset}: {e}")))
                })?,
            ),
            Whence::Current => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
        };

        self.resource()?.seek(position)?;
        self.eof = false;
        Ok(())
    }

    fn tell(&mut self) -> Result<u64, MessageError> {
        Ok(self.resource()?.stream_position()?)
    }

    fn eof(&mut self) -> bool {
        if !matches!(self.state, State::Open(_)) || self.eof {
            return true;
        }
        if !self.seekable {
            return false;
        }

        match (self.tell(), self.size()) {
            (Ok(position), Some(size)) => position >= size,
            _ => false,
        }
    }

    fn size(&mut self) -> Option<u64> {
        if self.size.is_none() {
            self.size = match &self.state {
                State::Open(resource) => resource.size().ok(),
                State::Detached | State::Closed => None,
            };
        }
        self.size
    }

    fn contents(&mut self) -> Result<Bytes, MessageError> {
        ensure!(self.readable, MessageError::NotReadable);

        let mut buf = Vec::new();
        self.resource()?.read_to_end(&mut buf)?;
        self.eof = true;
        Ok(Bytes::from(buf))
    }

    fn read_all(&mut self) -> Result<Bytes, MessageError> {
        if self.seekable {
            self.seek(0, Whence::Start)?;
        }
        self.contents()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let State::Open(_) = self.state {
            trace!(mode = %self.mode, "closing stream on drop");
        }
    }
}

impl Default for Stream {
    fn default() -> Self {
        Stream::memory()
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Stream")
            .field("mode", &inner.mode)
            .field("state", &inner.state())
            .field("readable", &inner.readable)
            .field("writable", &inner.writable)
            .field("seekable", &inner.seekable)
            .finish_non_exhaustive()
    }
}

/// Reads the whole stream from the start; any failure yields an empty string.
impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lock().read_all() {
            Ok(bytes) => f.write_str(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                debug!(cause = %e, "failed to read stream as string");
                Ok(())
            }
        }
    }
}
