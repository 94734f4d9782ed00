//! CLI for objseek remote object streams.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use objseek_core::config::{self, ObjseekConfig};
use objseek_core::{sweep_stale, HttpObjectApi};
use std::path::PathBuf;

use commands::{run_cat, run_digest, run_fetch, run_stat, run_sweep};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "objseek")]
#[command(about = "objseek: seekable streams over an HTTP object store", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/objseek/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show size and metadata of an object.
    Stat {
        bucket: String,
        key: String,
        /// Print metadata as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Stream an object to stdout.
    Cat {
        bucket: String,
        key: String,
        /// Start at this byte offset.
        #[arg(long, default_value = "0", value_name = "N")]
        offset: u64,
    },

    /// Download an object through a temp file, then move it into place.
    Fetch {
        bucket: String,
        key: String,
        /// Destination path.
        output: PathBuf,
    },

    /// Compute SHA-256 of an object without storing it.
    Digest { bucket: String, key: String },

    /// Delete stale temp files left by earlier runs.
    Sweep,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        let temp_dir = cfg.temp_dir();
        if cfg.sweep_on_start && temp_dir.is_dir() && !matches!(cli.command, CliCommand::Sweep) {
            sweep_stale(&temp_dir, &cfg.temp_prefix).context("cleaning stale temp files")?;
        }

        match cli.command {
            CliCommand::Stat { bucket, key, json } => run_stat(&api(&cfg)?, &bucket, &key, json)?,
            CliCommand::Cat {
                bucket,
                key,
                offset,
            } => run_cat(&api(&cfg)?, &bucket, &key, offset)?,
            CliCommand::Fetch {
                bucket,
                key,
                output,
            } => run_fetch(&api(&cfg)?, &cfg, &bucket, &key, &output)?,
            CliCommand::Digest { bucket, key } => run_digest(&api(&cfg)?, &bucket, &key)?,
            CliCommand::Sweep => run_sweep(&cfg)?,
        }

        Ok(())
    }
}

fn api(cfg: &ObjseekConfig) -> Result<HttpObjectApi> {
    HttpObjectApi::new(&cfg.endpoint, cfg.headers.clone(), cfg.curl_options())
        .with_context(|| format!("invalid endpoint {}", cfg.endpoint))
}

#[cfg(test)]
mod tests;
