use crate::api::CurlOptions;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default file-name prefix for staged temp files.
pub const DEFAULT_TEMP_PREFIX: &str = "objseek-";

/// HTTP transfer tuning (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub connect_timeout_secs: u64,
    /// Abort a transfer that stays below this many bytes/s ...
    pub low_speed_limit: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
        }
    }
}

impl TransportConfig {
    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            low_speed_limit: self.low_speed_limit,
            low_speed_time: Duration::from_secs(self.low_speed_time_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/objseek/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjseekConfig {
    /// Base URL of the object store; objects live at `{endpoint}/{bucket}/{key}`.
    pub endpoint: String,
    /// Extra headers sent with every request (e.g. `Authorization`).
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Directory for staged temp files; None = the platform temp dir.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// File-name prefix for staged temp files (also what the startup sweep matches).
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,
    /// Remove stale temp files under `temp_prefix` when the CLI starts.
    #[serde(default = "default_sweep_on_start")]
    pub sweep_on_start: bool,
    /// Optional transfer tuning; if missing, built-in defaults are used.
    #[serde(default)]
    pub transport: Option<TransportConfig>,
}

fn default_temp_prefix() -> String {
    DEFAULT_TEMP_PREFIX.to_string()
}

fn default_sweep_on_start() -> bool {
    true
}

impl Default for ObjseekConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:9000".to_string(),
            headers: HashMap::new(),
            temp_dir: None,
            temp_prefix: default_temp_prefix(),
            sweep_on_start: true,
            transport: None,
        }
    }
}

impl ObjseekConfig {
    /// Directory temp files are acquired in and swept from.
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn curl_options(&self) -> CurlOptions {
        self.transport.clone().unwrap_or_default().curl_options()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("objseek")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ObjseekConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ObjseekConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit file.
pub fn load_from(path: &Path) -> Result<ObjseekConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: ObjseekConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = ObjseekConfig::default();
        assert_eq!(cfg.endpoint, "http://127.0.0.1:9000");
        assert_eq!(cfg.temp_prefix, "objseek-");
        assert!(cfg.sweep_on_start);
        assert!(cfg.headers.is_empty());
        assert_eq!(cfg.temp_dir(), std::env::temp_dir());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = ObjseekConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ObjseekConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.endpoint, cfg.endpoint);
        assert_eq!(parsed.temp_prefix, cfg.temp_prefix);
        assert_eq!(parsed.sweep_on_start, cfg.sweep_on_start);
    }

    #[test]
    fn config_toml_minimal_uses_defaults() {
        let cfg: ObjseekConfig = toml::from_str(r#"endpoint = "https://s3.example""#).unwrap();
        assert_eq!(cfg.endpoint, "https://s3.example");
        assert_eq!(cfg.temp_prefix, DEFAULT_TEMP_PREFIX);
        assert!(cfg.sweep_on_start);
        assert!(cfg.temp_dir.is_none());
        assert!(cfg.transport.is_none());
        assert_eq!(cfg.curl_options().low_speed_limit, 1024);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            endpoint = "http://minio.local:9000"
            temp_dir = "/var/tmp/objseek"
            temp_prefix = "stage-"
            sweep_on_start = false

            [headers]
            Authorization = "Bearer abc"

            [transport]
            connect_timeout_secs = 5
            low_speed_limit = 4096
            low_speed_time_secs = 10
        "#;
        let cfg: ObjseekConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.temp_dir(), PathBuf::from("/var/tmp/objseek"));
        assert_eq!(cfg.temp_prefix, "stage-");
        assert!(!cfg.sweep_on_start);
        assert_eq!(cfg.headers.get("Authorization").map(String::as_str), Some("Bearer abc"));
        let curl = cfg.curl_options();
        assert_eq!(curl.connect_timeout, Duration::from_secs(5));
        assert_eq!(curl.low_speed_limit, 4096);
        assert_eq!(curl.low_speed_time, Duration::from_secs(10));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "endpoint = \"http://h:1\"\ntemp_prefix = \"t-\"\n").unwrap();
        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.endpoint, "http://h:1");
        assert_eq!(cfg.temp_prefix, "t-");
    }
}
