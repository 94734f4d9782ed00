pub mod config;
pub mod logging;

pub mod api;
pub mod checksum;
pub mod error;
pub mod scratch;
pub mod stream;

pub use api::{HttpObjectApi, MemoryObjectApi, ObjectApi, ObjectBody, ObjectStat};
pub use error::{ObjectError, SeekMode, TransportError};
pub use scratch::{sweep_stale, with_temp_file, TempObjectFile};
pub use stream::{Chunk, ObjectReadSeeker};
