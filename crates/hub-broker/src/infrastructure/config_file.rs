//! TOML configuration for the hub broker.
//!
//! ```toml
//! [server]
//! bind_address = "127.0.0.1"
//! port = 24900
//!
//! [hub]
//! dependent_domains = ["https://shop.example.com", "localhost:3000"]
//! log_level = "info"
//! ```
//!
//! Every field has a serde default, so a missing file (first run) or a file
//! written for an older version still loads.  Missing `dependent_domains`
//! means an empty allow-list: every sender is denied.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use hub_core::{AllowList, DomainSpec, OriginError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A dependent domain entry has no usable hostname.
    #[error("invalid dependent domain '{entry}': {source}")]
    InvalidDomain {
        entry: String,
        #[source]
        source: OriginError,
    },

    /// The bind address and port do not form a socket address.
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HubConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub hub: HubSection,
}

/// Where the WebSocket host listens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Broker behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HubSection {
    /// Parent sites allowed to talk to the hub: full origins or `host[:port]`.
    #[serde(default)]
    pub dependent_domains: Vec<String>,
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    24900
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            dependent_domains: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl HubConfig {
    /// Builds the broker's allow-list from `dependent_domains`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDomain`] for the first entry without a
    /// hostname.
    pub fn allow_list(&self) -> Result<AllowList, ConfigError> {
        self.hub
            .dependent_domains
            .iter()
            .map(|entry| {
                DomainSpec::parse(entry).map_err(|source| ConfigError::InvalidDomain {
                    entry: entry.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(AllowList::new)
    }

    /// Resolves `server.bind_address` and `server.port` into a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBindAddress`] if they do not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.server.bind_address, self.server.port);
        raw.parse().map_err(|_| ConfigError::InvalidBindAddress(raw))
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses a configuration document.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed.
pub fn parse_config(content: &str) -> Result<HubConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Loads [`HubConfig`] from `path`, returning defaults if the file does not
/// exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<HubConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HubConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg, HubConfig::default());
        assert_eq!(cfg.server.port, 24900);
        assert_eq!(cfg.hub.log_level, "info");
        assert!(cfg.allow_list().unwrap().is_empty());
    }

    #[test]
    fn test_full_document_parses() {
        let cfg = parse_config(
            r#"
            [server]
            bind_address = "0.0.0.0"
            port = 9000

            [hub]
            dependent_domains = ["https://shop.example.com", "localhost:3000"]
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.bind_addr().unwrap().to_string(), "0.0.0.0:9000");
        assert_eq!(cfg.hub.log_level, "debug");

        let list = cfg.allow_list().unwrap();
        assert_eq!(
            list.specs(),
            &[
                DomainSpec::any_port("shop.example.com"),
                DomainSpec::with_port("localhost", "3000"),
            ]
        );
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let cfg = parse_config("[server]\nport = 8080\n").unwrap();
        assert_eq!(cfg.server.bind_address, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let result = parse_config("[hub\ndependent_domains = 3");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_domain_is_reported() {
        let cfg = parse_config("[hub]\ndependent_domains = [\"file:///tmp\"]\n").unwrap();
        let err = cfg.allow_list().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDomain { ref entry, .. } if entry == "file:///tmp"));
    }

    #[test]
    fn test_invalid_bind_address_is_reported() {
        let mut cfg = HubConfig::default();
        cfg.server.bind_address = "not.an.ip".to_string();
        assert!(matches!(cfg.bind_addr(), Err(ConfigError::InvalidBindAddress(_))));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join(format!("hub-missing-{}.toml", uuid::Uuid::new_v4()));
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg, HubConfig::default());
    }

    #[test]
    fn test_existing_file_is_loaded() {
        let path = std::env::temp_dir().join(format!("hub-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[hub]\ndependent_domains = [\"a.test\"]\n").unwrap();

        let cfg = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(cfg.hub.dependent_domains, vec!["a.test".to_string()]);
    }
}
