//! Object-storage transport contracts.
//!
//! The stream layer only needs two calls from the outside world: fetch an
//! object from an offset to its end, and fetch its metadata. Signing, bucket
//! CRUD and multipart uploads live behind whatever implements `ObjectApi`.

mod http;
mod memory;

use crate::error::TransportError;
use serde::Serialize;
use std::io::Read;
use std::sync::Arc;

pub use http::{CurlOptions, HttpObjectApi};
pub use memory::MemoryObjectApi;

/// Streaming body of a fetch. Dropping it closes the underlying transfer,
/// whether or not it was read to the end.
pub type ObjectBody = Box<dyn Read + Send>;

/// Metadata returned by both a data fetch and a metadata query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectStat {
    /// Total object size in bytes (not the size of the fetched range).
    pub size: u64,
    /// Entity tag with surrounding quotes removed.
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_type: Option<String>,
}

/// Remote fetch capability consumed by `ObjectReadSeeker`.
pub trait ObjectApi: Send + Sync {
    /// Fetch `bucket/key` from `offset` through the end of the object.
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
    ) -> Result<(ObjectBody, ObjectStat), TransportError>;

    /// Fetch metadata for `bucket/key` without transferring its bytes.
    fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectStat, TransportError>;
}

impl<T: ObjectApi + ?Sized> ObjectApi for Arc<T> {
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
    ) -> Result<(ObjectBody, ObjectStat), TransportError> {
        (**self).get_object(bucket, key, offset)
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectStat, TransportError> {
        (**self).head_object(bucket, key)
    }
}

impl<T: ObjectApi + ?Sized> ObjectApi for &T {
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
    ) -> Result<(ObjectBody, ObjectStat), TransportError> {
        (**self).get_object(bucket, key, offset)
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectStat, TransportError> {
        (**self).head_object(bucket, key)
    }
}

impl<T: ObjectApi + ?Sized> ObjectApi for Box<T> {
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
    ) -> Result<(ObjectBody, ObjectStat), TransportError> {
        (**self).get_object(bucket, key, offset)
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectStat, TransportError> {
        (**self).head_object(bucket, key)
    }
}
