//! `objseek stat` – object size and metadata via a metadata-only query.

use anyhow::Result;
use objseek_core::{ObjectApi, ObjectReadSeeker};

pub fn run_stat(api: &impl ObjectApi, bucket: &str, key: &str, json: bool) -> Result<()> {
    let stream = ObjectReadSeeker::new(api, bucket, key);
    stream.size()?;
    let stat = stream.stat().unwrap_or_default();

    if json {
        println!("{}", serde_json::to_string_pretty(&stat)?);
        return Ok(());
    }
    println!("{:<14} {}/{}", "OBJECT", bucket, key);
    println!("{:<14} {}", "SIZE", stat.size);
    println!("{:<14} {}", "ETAG", stat.etag.as_deref().unwrap_or("-"));
    println!(
        "{:<14} {}",
        "LAST-MODIFIED",
        stat.last_modified.as_deref().unwrap_or("-")
    );
    println!(
        "{:<14} {}",
        "CONTENT-TYPE",
        stat.content_type.as_deref().unwrap_or("-")
    );
    Ok(())
}
