use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::http::parser::ParseLimits;

/// Serve options.
///
/// Every field has a default, so a YAML file only needs the keys it changes:
///
/// ```yaml
/// listen_addr: 0.0.0.0:8443
/// hide_server_version: false
/// tls:
///   enabled: true
///   cert_path: /etc/nocturne/cert.pem
///   key_path: /etc/nocturne/key.pem
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    /// Send `Server: Nocturne` instead of `Server: Nocturne/<version>`.
    pub hide_server_version: bool,
    pub tls: TlsConfig,
    pub limits: Limits,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub enabled: bool,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_head_bytes: usize,
    pub max_body_bytes: usize,
    /// Largest inbound WebSocket payload.
    pub max_message_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8765".to_string(),
            hide_server_version: true,
            tls: TlsConfig::default(),
            limits: Limits::default(),
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cert_path: PathBuf::from("cert.pem"),
            key_path: PathBuf::from("key.pem"),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_head_bytes: 16 * 1024,
            max_body_bytes: 2 * 1024 * 1024,
            max_message_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Limits {
    pub fn parse_limits(&self) -> ParseLimits {
        ParseLimits {
            max_head_bytes: self.max_head_bytes,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

impl Config {
    /// Loads from `NOCTURNE_CONFIG` (a YAML file) and the `LISTEN` override.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = match lookup("NOCTURNE_CONFIG") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(listen_addr) = lookup("LISTEN") {
            cfg.listen_addr = listen_addr;
        }
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
