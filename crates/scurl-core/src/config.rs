use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::easy::Easy;
use crate::multi::Multi;

/// Defaults applied to every easy handle the CLI creates (`[transfer]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// User-Agent header; None leaves libcurl's default (no header).
    pub user_agent: Option<String>,
    pub follow_redirects: bool,
    /// Redirect limit when following; None = libcurl default.
    pub max_redirections: Option<u32>,
    pub connect_timeout_secs: Option<u64>,
    /// Whole-transfer timeout in seconds; None = no limit.
    pub timeout_secs: Option<u64>,
    pub verify_peer: bool,
    pub verify_host: bool,
    pub proxy: Option<String>,
    pub noproxy: Option<String>,
    /// Extra request headers, e.g. `"Accept: */*"`.
    pub headers: Vec<String>,
    /// Forward libcurl's verbose output into the log.
    pub verbose: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(format!("scurl/{}", env!("CARGO_PKG_VERSION"))),
            follow_redirects: true,
            max_redirections: Some(10),
            connect_timeout_secs: Some(30),
            timeout_secs: None,
            verify_peer: true,
            verify_host: true,
            proxy: None,
            noproxy: None,
            headers: Vec::new(),
            verbose: false,
        }
    }
}

impl TransferConfig {
    /// Sets every configured option on `easy`.
    pub fn apply(&self, easy: &mut Easy) -> crate::Result<()> {
        if let Some(ua) = &self.user_agent {
            easy.user_agent(ua)?;
        }
        easy.follow_location(self.follow_redirects)?;
        if let Some(max) = self.max_redirections {
            easy.max_redirections(max)?;
        }
        if let Some(secs) = self.connect_timeout_secs {
            easy.connect_timeout(Duration::from_secs(secs))?;
        }
        if let Some(secs) = self.timeout_secs {
            easy.timeout(Duration::from_secs(secs))?;
        }
        easy.ssl_verify_peer(self.verify_peer)?;
        easy.ssl_verify_host(self.verify_host)?;
        if let Some(proxy) = &self.proxy {
            easy.proxy(proxy)?;
        }
        if let Some(noproxy) = &self.noproxy {
            easy.noproxy(noproxy)?;
        }
        if !self.headers.is_empty() {
            easy.http_headers(&self.headers)?;
        }
        if self.verbose {
            easy.trace_to_log()?;
        }
        Ok(())
    }
}

/// Connection limits for multi transfers (`[multi]`). None keeps libcurl's default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiConfig {
    pub max_total_connections: Option<usize>,
    pub max_host_connections: Option<usize>,
    /// Connection cache size.
    pub max_connects: Option<usize>,
    pub max_concurrent_streams: Option<usize>,
}

impl MultiConfig {
    pub fn apply(&self, multi: &mut Multi<'_>) -> crate::Result<()> {
        if let Some(n) = self.max_total_connections {
            multi.set_max_total_connections(n)?;
        }
        if let Some(n) = self.max_host_connections {
            multi.set_max_host_connections(n)?;
        }
        if let Some(n) = self.max_connects {
            multi.set_max_connects(n)?;
        }
        if let Some(n) = self.max_concurrent_streams {
            multi.set_max_concurrent_streams(n)?;
        }
        Ok(())
    }
}

/// Global configuration loaded from `~/.config/scurl/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScurlConfig {
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub multi: MultiConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("scurl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ScurlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ScurlConfig::default();
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

pub fn load_from(path: &Path) -> Result<ScurlConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: ScurlConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
