//! Lazy, seekable stream over a remote object.
//!
//! No network traffic happens until the first read after construction or a
//! seek; that read fetches from the current offset to the end of the object
//! and later reads continue from the same body. Seeking only records the new
//! offset and closes whatever body is held. Bodies that reach end of object
//! or fail are drained and closed before the read returns, so a stream never
//! keeps a connection open past a terminal read.
//!
//! All operations take `&self` and serialize on one mutex per instance.

mod state;

use crate::api::{ObjectApi, ObjectStat};
use crate::error::{ObjectError, SeekMode, TransportError};
use state::{drain_and_close, Cursor, FetchState};
use std::io::{self, Read, Seek, SeekFrom};
use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Outcome of `ObjectReadSeeker::read_chunk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Bytes copied into the caller's buffer.
    pub len: usize,
    /// End of object reached. May be set together with `len > 0`.
    pub eof: bool,
}

impl Chunk {
    const END: Chunk = Chunk { len: 0, eof: true };
}

/// `Read + Seek` view of `bucket/key` through an `ObjectApi`.
pub struct ObjectReadSeeker<A> {
    api: A,
    bucket: String,
    key: String,
    cursor: Mutex<Cursor>,
}

impl<A: ObjectApi> ObjectReadSeeker<A> {
    /// Bind a stream to one object. Does not touch the network.
    pub fn new(api: A, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            api,
            bucket: bucket.into(),
            key: key.into(),
            cursor: Mutex::new(Cursor::new()),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Offset the next read starts from.
    pub fn position(&self) -> u64 {
        self.lock().offset
    }

    /// Metadata from the last fetch or `size` call, if any. No network call.
    pub fn stat(&self) -> Option<ObjectStat> {
        self.lock().stat.clone()
    }

    /// Fill `buf` from the object, fetching from the current offset if no body is held.
    ///
    /// Returns fewer than `buf.len()` bytes only at end of object, in which case
    /// `eof` is set and the body is already closed. On a body error the body is
    /// drained and closed, nothing is returned, and the offset stays where it
    /// was, so retrying the same read fetches the same bytes again. A failed
    /// fetch leaves the stream untouched.
    pub fn read_chunk(&self, buf: &mut [u8]) -> Result<Chunk, ObjectError> {
        let mut cur = self.lock();
        if matches!(cur.state, FetchState::Exhausted) {
            return Ok(Chunk::END);
        }
        if buf.is_empty() {
            return Ok(Chunk { len: 0, eof: false });
        }

        let (mut body, started_at) = match mem::replace(&mut cur.state, FetchState::Idle) {
            FetchState::Fetching { body, started_at } => (body, started_at),
            FetchState::Idle | FetchState::Exhausted => {
                let offset = cur.offset;
                let (body, stat) = self
                    .api
                    .get_object(&self.bucket, &self.key, offset)
                    .map_err(|source| self.transport_error(source))?;
                tracing::debug!(
                    bucket = %self.bucket,
                    key = %self.key,
                    offset,
                    size = stat.size,
                    "object fetch opened"
                );
                cur.stat = Some(stat);
                (body, offset)
            }
        };

        let mut filled = 0;
        while filled < buf.len() {
            match body.read(&mut buf[filled..]) {
                Ok(0) => {
                    drain_and_close(body);
                    cur.offset += filled as u64;
                    cur.state = FetchState::Exhausted;
                    tracing::debug!(
                        bucket = %self.bucket,
                        key = %self.key,
                        started_at,
                        end = cur.offset,
                        "object fetch exhausted"
                    );
                    return Ok(Chunk {
                        len: filled,
                        eof: true,
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(source) => {
                    drain_and_close(body);
                    tracing::warn!(
                        bucket = %self.bucket,
                        key = %self.key,
                        offset = cur.offset,
                        error = %source,
                        "object read failed, fetch closed"
                    );
                    return Err(ObjectError::Read {
                        bucket: self.bucket.clone(),
                        key: self.key.clone(),
                        offset: cur.offset,
                        source,
                    });
                }
            }
        }

        cur.offset += filled as u64;
        cur.state = FetchState::Fetching { body, started_at };
        Ok(Chunk {
            len: filled,
            eof: false,
        })
    }

    /// Reposition to an absolute offset and close any held body.
    ///
    /// `SeekFrom::Current` and `SeekFrom::End` are rejected with
    /// `ObjectError::UnsupportedSeek` and leave the stream unchanged.
    pub fn seek_to(&self, pos: SeekFrom) -> Result<u64, ObjectError> {
        let offset = match pos {
            SeekFrom::Start(offset) => offset,
            SeekFrom::Current(_) => return Err(ObjectError::UnsupportedSeek(SeekMode::Current)),
            SeekFrom::End(_) => return Err(ObjectError::UnsupportedSeek(SeekMode::End)),
        };

        let mut cur = self.lock();
        let previous = mem::replace(&mut cur.state, FetchState::Idle);
        tracing::trace!(
            from = cur.offset,
            to = offset,
            state = previous.name(),
            "object stream seek"
        );
        if let FetchState::Fetching { body, started_at } = previous {
            tracing::debug!(
                bucket = %self.bucket,
                key = %self.key,
                started_at,
                "seek closed active object fetch"
            );
            drop(body);
        }
        cur.offset = offset;
        Ok(offset)
    }

    /// Object size from a metadata-only query. Does not disturb reads.
    pub fn size(&self) -> Result<u64, ObjectError> {
        let mut cur = self.lock();
        let stat = self
            .api
            .head_object(&self.bucket, &self.key)
            .map_err(|source| self.transport_error(source))?;
        let size = stat.size;
        cur.stat = Some(stat);
        Ok(size)
    }

    fn lock(&self) -> MutexGuard<'_, Cursor> {
        // State is consistent after every early return, so a poisoned lock is usable.
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transport_error(&self, source: TransportError) -> ObjectError {
        ObjectError::Transport {
            bucket: self.bucket.clone(),
            key: self.key.clone(),
            source,
        }
    }
}

impl<A: ObjectApi> Read for &ObjectReadSeeker<A> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_chunk(buf)?.len)
    }
}

impl<A: ObjectApi> Read for ObjectReadSeeker<A> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }
}

impl<A: ObjectApi> Seek for &ObjectReadSeeker<A> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }
}

impl<A: ObjectApi> Seek for ObjectReadSeeker<A> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        (&*self).seek(pos)
    }
}
