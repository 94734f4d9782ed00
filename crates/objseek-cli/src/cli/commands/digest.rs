//! `objseek digest` – SHA-256 of a remote object, streamed.

use anyhow::Result;
use objseek_core::checksum;
use objseek_core::{ObjectApi, ObjectReadSeeker};

pub fn run_digest(api: &impl ObjectApi, bucket: &str, key: &str) -> Result<()> {
    let stream = ObjectReadSeeker::new(api, bucket, key);
    let (digest, len) = checksum::sha256_reader(&stream)?;
    tracing::debug!(bucket, key, len, "digest computed");
    println!("{}  {}/{}", digest, bucket, key);
    Ok(())
}
