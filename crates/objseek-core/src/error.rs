//! Error types for object transports, streams, and temp files.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failure reported by an `ObjectApi` implementation (network, HTTP status, missing object).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Curl reported an error (timeout, connection refused, aborted transfer).
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    /// Response had a status the transport does not accept.
    #[error("HTTP {code} from {url}")]
    Http { code: u32, url: String },
    /// Metadata response carried no `Content-Length`, so the size is unknown.
    #[error("no Content-Length in metadata response from {url}")]
    MissingLength { url: String },
    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },
    #[error("invalid object URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("transport i/o: {0}")]
    Io(#[from] io::Error),
}

/// Seek origin, used to report which `SeekFrom` variant was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    Start,
    Current,
    End,
}

impl fmt::Display for SeekMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeekMode::Start => write!(f, "start"),
            SeekMode::Current => write!(f, "current"),
            SeekMode::End => write!(f, "end"),
        }
    }
}

/// Error surfaced by `ObjectReadSeeker` and `TempObjectFile`.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    /// Fetch or metadata query for the object failed.
    #[error("object {bucket}/{key}")]
    Transport {
        bucket: String,
        key: String,
        source: TransportError,
    },
    /// The object body failed mid-read; the stream has already closed it.
    #[error("reading {bucket}/{key} at offset {offset}")]
    Read {
        bucket: String,
        key: String,
        offset: u64,
        source: io::Error,
    },
    /// Temp file creation, deletion, or sweep failed.
    #[error("temp file {}", .path.display())]
    Filesystem { path: PathBuf, source: io::Error },
    /// Only absolute (`SeekFrom::Start`) positioning is implemented.
    #[error("seek relative to {0} is not supported; only absolute seeks are")]
    UnsupportedSeek(SeekMode),
    /// The temp file was already released.
    #[error("temp file {} was released", .path.display())]
    Released { path: PathBuf },
}

impl ObjectError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ObjectError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<ObjectError> for io::Error {
    fn from(err: ObjectError) -> Self {
        let kind = match &err {
            ObjectError::UnsupportedSeek(_) => io::ErrorKind::Unsupported,
            ObjectError::Read { source, .. } | ObjectError::Filesystem { source, .. } => {
                source.kind()
            }
            ObjectError::Transport { .. } | ObjectError::Released { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
