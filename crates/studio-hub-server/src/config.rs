//! Configuration loading and parsing.
//!
//! Defines the server config schema and resolves defaults. Values are read
//! once at startup; nothing here can change while the server runs.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_NODE_ID: &str = "soundz-studio-node";
pub const DEFAULT_FIFO_PATH: &str = "/tmp/snapfifo";
pub const DEFAULT_YT_DLP: &str = "yt-dlp";
pub const DEFAULT_WPCTL: &str = "wpctl";
pub const DEFAULT_SEARCH_LIMIT: u32 = 5;
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_VOLUME_TIMEOUT_SECS: u64 = 5;

/// Top-level server configuration loaded from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    /// Bind address (host:port).
    pub bind: Option<String>,
    /// Node identifier reported by `/api/status`.
    pub node_id: Option<String>,
    /// Named pipe read by the broadcast service.
    pub fifo_path: Option<String>,
    /// Path or name of the yt-dlp binary.
    pub yt_dlp_path: Option<String>,
    /// Path or name of the wpctl binary.
    pub wpctl_path: Option<String>,
    /// Number of search results requested from yt-dlp.
    pub search_limit: Option<u32>,
    /// Deadline for a single search, in seconds.
    pub search_timeout_secs: Option<u64>,
    /// Deadline for a volume change, in seconds.
    pub volume_timeout_secs: Option<u64>,
}

/// Config with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub bind: SocketAddr,
    pub node_id: String,
    pub fifo_path: PathBuf,
    pub yt_dlp_path: String,
    pub wpctl_path: String,
    pub search_limit: u32,
    pub search_timeout: Duration,
    pub volume_timeout: Duration,
}

impl ServerConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<ServerConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        Ok(cfg)
    }

    /// Apply defaults; an explicit `bind` overrides the config value.
    pub fn resolve(&self, bind: Option<SocketAddr>) -> Result<ResolvedConfig> {
        let bind = match bind {
            Some(addr) => addr,
            None => match bind_from_config(self)? {
                Some(addr) => addr,
                None => DEFAULT_BIND.parse().context("parse default bind")?,
            },
        };
        let search_limit = self.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        if search_limit == 0 {
            return Err(anyhow::anyhow!("search_limit must be at least 1"));
        }
        Ok(ResolvedConfig {
            bind,
            node_id: non_empty(self.node_id.as_deref()).unwrap_or(DEFAULT_NODE_ID).to_string(),
            fifo_path: PathBuf::from(
                non_empty(self.fifo_path.as_deref()).unwrap_or(DEFAULT_FIFO_PATH),
            ),
            yt_dlp_path: non_empty(self.yt_dlp_path.as_deref())
                .unwrap_or(DEFAULT_YT_DLP)
                .to_string(),
            wpctl_path: non_empty(self.wpctl_path.as_deref())
                .unwrap_or(DEFAULT_WPCTL)
                .to_string(),
            search_limit,
            search_timeout: Duration::from_secs(
                self.search_timeout_secs.unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS),
            ),
            volume_timeout: Duration::from_secs(
                self.volume_timeout_secs.unwrap_or(DEFAULT_VOLUME_TIMEOUT_SECS),
            ),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse an optional bind address from config.
pub fn bind_from_config(cfg: &ServerConfig) -> Result<Option<SocketAddr>> {
    let Some(bind) = cfg.bind.as_deref() else {
        return Ok(None);
    };
    let addr = bind.parse().with_context(|| format!("parse bind {bind}"))?;
    Ok(Some(addr))
}
