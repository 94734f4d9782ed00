//! `objseek fetch` – download into a temp file next to the output, then rename into place.

use anyhow::{Context, Result};
use objseek_core::checksum::sha256_path;
use objseek_core::config::ObjseekConfig;
use objseek_core::{sweep_stale, ObjectApi, ObjectReadSeeker, TempObjectFile};
use std::io;
use std::path::Path;

pub fn run_fetch(
    api: &impl ObjectApi,
    cfg: &ObjseekConfig,
    bucket: &str,
    key: &str,
    output: &Path,
) -> Result<()> {
    // Stage beside the output so the final rename never crosses filesystems.
    let staging = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    std::fs::create_dir_all(&staging)
        .with_context(|| format!("creating output dir {}", staging.display()))?;
    if cfg.sweep_on_start && staging != cfg.temp_dir() {
        sweep_stale(&staging, &cfg.temp_prefix).context("cleaning stale temp files")?;
    }

    let stream = ObjectReadSeeker::new(api, bucket, key);
    // Dropping `temp` on any early return removes the partial download.
    let mut temp = TempObjectFile::acquire(&staging, &cfg.temp_prefix)?;
    let written = io::copy(&mut &stream, &mut temp)
        .with_context(|| format!("downloading {}/{}", bucket, key))?;
    temp.sync()?;
    temp.persist(output)?;

    let digest = sha256_path(output)?;
    tracing::info!(bucket, key, written, %digest, output = %output.display(), "object fetched");
    println!("{} bytes -> {} (sha256 {})", written, output.display(), digest);
    Ok(())
}
