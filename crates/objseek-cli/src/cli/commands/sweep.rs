//! `objseek sweep` – delete stale temp files under the configured prefix.

use anyhow::Result;
use objseek_core::config::ObjseekConfig;
use objseek_core::sweep_stale;

pub fn run_sweep(cfg: &ObjseekConfig) -> Result<()> {
    let dir = cfg.temp_dir();
    let removed = sweep_stale(&dir, &cfg.temp_prefix)?;
    println!(
        "Removed {} stale temp file(s) matching {}* in {}",
        removed,
        cfg.temp_prefix,
        dir.display()
    );
    Ok(())
}
