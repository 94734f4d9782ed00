//! `objseek cat` – stream an object to stdout.

use anyhow::Result;
use objseek_core::{ObjectApi, ObjectReadSeeker};
use std::io::{self, SeekFrom, Write};

pub fn run_cat(api: &impl ObjectApi, bucket: &str, key: &str, offset: u64) -> Result<()> {
    let stream = ObjectReadSeeker::new(api, bucket, key);
    if offset > 0 {
        stream.seek_to(SeekFrom::Start(offset))?;
    }
    let mut out = io::stdout().lock();
    io::copy(&mut &stream, &mut out)?;
    out.flush()?;
    Ok(())
}
