//! In-process object store implementing `ObjectApi`.
//!
//! Keeps objects in a `bucket/key` map and counts how many bodies it has
//! handed out and how many were closed, so leaks are observable.

use super::{ObjectApi, ObjectBody, ObjectStat};
use crate::error::TransportError;
use std::collections::HashMap;
use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct Counters {
    fetches: AtomicUsize,
    closes: AtomicUsize,
    heads: AtomicUsize,
}

/// Thread-safe in-memory object map.
#[derive(Debug, Default)]
pub struct MemoryObjectApi {
    objects: Mutex<HashMap<(String, String), Arc<Vec<u8>>>>,
    counters: Arc<Counters>,
}

impl MemoryObjectApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` under `bucket/key`, replacing any previous object.
    pub fn put(&self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((bucket.to_string(), key.to_string()), Arc::new(data.into()));
    }

    /// Number of `get_object` calls that returned a body.
    pub fn fetch_count(&self) -> usize {
        self.counters.fetches.load(Ordering::SeqCst)
    }

    /// Number of bodies that have been dropped.
    pub fn close_count(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    pub fn head_count(&self) -> usize {
        self.counters.heads.load(Ordering::SeqCst)
    }

    /// Bodies handed out but not yet closed.
    pub fn open_bodies(&self) -> usize {
        self.fetch_count().saturating_sub(self.close_count())
    }

    fn lookup(&self, bucket: &str, key: &str) -> Result<Arc<Vec<u8>>, TransportError> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| TransportError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

impl ObjectApi for MemoryObjectApi {
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
    ) -> Result<(ObjectBody, ObjectStat), TransportError> {
        let data = self.lookup(bucket, key)?;
        let stat = ObjectStat {
            size: data.len() as u64,
            ..ObjectStat::default()
        };
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
        self.counters.fetches.fetch_add(1, Ordering::SeqCst);
        let body = MemoryBody {
            data,
            pos: start,
            counters: Arc::clone(&self.counters),
        };
        Ok((Box::new(body), stat))
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectStat, TransportError> {
        self.counters.heads.fetch_add(1, Ordering::SeqCst);
        let data = self.lookup(bucket, key)?;
        Ok(ObjectStat {
            size: data.len() as u64,
            ..ObjectStat::default()
        })
    }
}

/// Body over a shared object buffer; counts its own close on drop.
struct MemoryBody {
    data: Arc<Vec<u8>>,
    pos: usize,
    counters: Arc<Counters>,
}

impl Read for MemoryBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let rest = &self.data[self.pos..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl Drop for MemoryBody {
    fn drop(&mut self) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}
