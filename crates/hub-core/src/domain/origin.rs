//! The hub's trust boundary: which parent origins may talk to it.
//!
//! A browser labels every cross-document message with the sender's origin,
//! serialized as `scheme://host[:port]`.  The hub keeps a fixed
//! [`AllowList`] of [`DomainSpec`] entries and compares the hostname and port
//! of each inbound origin against it.
//!
//! # Matching rules
//!
//! An origin is approved when at least one entry satisfies both:
//!
//! 1. The entry's `hostname` equals the origin's hostname, exactly as
//!    strings.  No wildcards, no subdomain matching.
//! 2. The entry's `port` is unset, or equals the origin's port.
//!
//! Leaving `port` unset trusts a hostname on any port (handy for local
//! development); setting it pins trust to a single port.
//!
//! Origin string comparison is the entire trust boundary: there is no
//! cryptographic authentication behind it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Ports a browser leaves out of a serialized origin (http/ws and https/wss).
const DEFAULT_PORTS: [&str; 2] = ["80", "443"];

/// Errors produced while splitting an origin or a configured domain into
/// hostname and port.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OriginError {
    /// The string is not an absolute URL (e.g. the opaque origin `"null"`).
    #[error("unparseable origin '{0}'")]
    Unparseable(String),

    /// The string parsed, but has no host component (e.g. `file:///`).
    #[error("origin '{0}' has no hostname")]
    MissingHost(String),
}

/// Hostname and port extracted from an origin string.
///
/// `port` is `None` when the origin uses the default port for its scheme,
/// matching the browser's `URL.port` (empty string) behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginParts {
    pub hostname: String,
    pub port: Option<String>,
}

impl OriginParts {
    /// Splits a serialized origin such as `https://app.example.com:8443`.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError::Unparseable`] for anything that is not an
    /// absolute URL, and [`OriginError::MissingHost`] for host-less URLs.
    pub fn parse(origin: &str) -> Result<Self, OriginError> {
        let url = Url::parse(origin).map_err(|_| OriginError::Unparseable(origin.to_string()))?;
        let hostname = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| OriginError::MissingHost(origin.to_string()))?
            .to_string();
        Ok(Self {
            hostname,
            port: url.port().map(|p| p.to_string()),
        })
    }
}

/// One trusted parent origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSpec {
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

impl DomainSpec {
    /// A spec that trusts `hostname` on every port.
    pub fn any_port(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: None,
        }
    }

    /// A spec that trusts `hostname` only on `port`.
    pub fn with_port(hostname: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: Some(port.into()),
        }
    }

    /// Builds a spec from an operator-supplied domain entry.
    ///
    /// Two forms are accepted:
    ///
    /// - a full origin, `https://app.example.com:8443` (parsed like an
    ///   inbound origin, so a default port is dropped), or
    /// - a bare `host[:port]`, `localhost:3000` or `app.example.com`.
    ///
    /// Inbound origins never report a scheme's default port, so `80` and
    /// `443` in a bare entry are dropped as well; `app.example.com:443`
    /// yields the same spec as `https://app.example.com`.
    ///
    /// # Errors
    ///
    /// Returns an [`OriginError`] when no hostname can be extracted.
    pub fn parse(entry: &str) -> Result<Self, OriginError> {
        let entry = entry.trim();
        if entry.contains("://") {
            let parts = OriginParts::parse(entry)?;
            return Ok(Self {
                hostname: parts.hostname,
                port: parts.port,
            });
        }

        let (host, port) = match entry.rsplit_once(':') {
            Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
                (host, Some(port.to_string()).filter(|p| !DEFAULT_PORTS.contains(&p.as_str())))
            }
            _ => (entry, None),
        };
        if host.is_empty() {
            return Err(OriginError::MissingHost(entry.to_string()));
        }
        Ok(Self {
            hostname: host.to_string(),
            port,
        })
    }

    /// Returns `true` if this spec trusts the given hostname/port pair.
    pub fn matches(&self, parts: &OriginParts) -> bool {
        self.hostname == parts.hostname
            && match &self.port {
                None => true,
                Some(port) => parts.port.as_deref() == Some(port.as_str()),
            }
    }
}

/// The fixed set of trusted parent origins.
///
/// Built once at startup and never mutated afterwards; share it behind an
/// `Arc` when several tasks need it.  Entry order has no effect on matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    specs: Vec<DomainSpec>,
}

impl AllowList {
    pub fn new(specs: Vec<DomainSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[DomainSpec] {
        &self.specs
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Returns `true` iff some entry trusts `origin`.
    ///
    /// An origin that cannot be split into hostname and port matches nothing.
    pub fn approves(&self, origin: &str) -> bool {
        match OriginParts::parse(origin) {
            Ok(parts) => self.specs.iter().any(|spec| spec.matches(&parts)),
            Err(e) => {
                tracing::trace!("origin not approved: {e}");
                false
            }
        }
    }
}

impl FromIterator<DomainSpec> for AllowList {
    fn from_iter<I: IntoIterator<Item = DomainSpec>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
