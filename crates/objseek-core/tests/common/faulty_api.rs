//! `ObjectApi` wrapper that injects fetch and mid-body failures.

use objseek_core::{MemoryObjectApi, ObjectApi, ObjectBody, ObjectStat, TransportError};
use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Wraps a `MemoryObjectApi`. Failures are armed per call and consumed once.
#[derive(Default)]
pub struct FaultyApi {
    pub inner: MemoryObjectApi,
    fail_fetches: AtomicUsize,
    /// When non-zero, the next body fails after yielding this many bytes.
    fail_body_after: AtomicUsize,
    drained: Arc<AtomicUsize>,
}

impl FaultyApi {
    pub fn with_object(bucket: &str, key: &str, data: &[u8]) -> Self {
        let api = Self::default();
        api.inner.put(bucket, key, data.to_vec());
        api
    }

    /// Make the next `n` fetches fail before returning a body.
    pub fn fail_next_fetches(&self, n: usize) {
        self.fail_fetches.store(n, Ordering::SeqCst);
    }

    /// Make the next body fail with `ConnectionReset` after `bytes` bytes.
    pub fn fail_next_body_after(&self, bytes: usize) {
        self.fail_body_after.store(bytes, Ordering::SeqCst);
    }

    /// Bytes read from faulty bodies after their injected error (drained before close).
    pub fn drained_bytes(&self) -> usize {
        self.drained.load(Ordering::SeqCst)
    }
}

impl ObjectApi for FaultyApi {
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
    ) -> Result<(ObjectBody, ObjectStat), TransportError> {
        let armed = self
            .fail_fetches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if armed.is_ok() {
            return Err(TransportError::Http {
                code: 503,
                url: format!("mem://{bucket}/{key}"),
            });
        }
        let (body, stat) = self.inner.get_object(bucket, key, offset)?;
        let fail_after = self.fail_body_after.swap(0, Ordering::SeqCst);
        if fail_after == 0 {
            return Ok((body, stat));
        }
        let faulty = FaultyBody {
            inner: body,
            remaining: fail_after,
            failed: false,
            drained: Arc::clone(&self.drained),
        };
        Ok((Box::new(faulty), stat))
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectStat, TransportError> {
        self.inner.head_object(bucket, key)
    }
}

/// Yields `remaining` bytes, fails once, then behaves like the inner body.
struct FaultyBody {
    inner: ObjectBody,
    remaining: usize,
    failed: bool,
    drained: Arc<AtomicUsize>,
}

impl Read for FaultyBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.failed {
            let n = self.inner.read(buf)?;
            self.drained.fetch_add(n, Ordering::SeqCst);
            return Ok(n);
        }
        if self.remaining == 0 {
            self.failed = true;
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "injected reset"));
        }
        let cap = self.remaining.min(buf.len());
        let n = self.inner.read(&mut buf[..cap])?;
        self.remaining -= n;
        Ok(n)
    }
}
