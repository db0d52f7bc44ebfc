//! Typed requests posted by dependent apps.
//!
//! On the wire a request is `{"dataKey", "kind", "config"}`.  The shape of
//! `config` depends on `kind`: a `set` must carry the data to persist, while
//! a `get` may carry a reset flag and optional seed data.  Rather than keep
//! one loose config object and inspect its fields later, the decoder resolves
//! the variant once, so every later stage works with [`Config::Getter`] or
//! [`Config::Setter`].

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Wire literal for a read request.
pub const KIND_GET: &str = "get";
/// Wire literal for a write request.
pub const KIND_SET: &str = "set";

/// What the dependent app wants the hub to do.
///
/// Only `get` and `set` are understood by the generic routes.  Any other
/// literal is kept verbatim as [`RequestKind::Unrecognized`] so that a route
/// registered for the request's data key can still serve it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Get,
    Set,
    Unrecognized(String),
}

impl RequestKind {
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            KIND_GET => Self::Get,
            KIND_SET => Self::Set,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => KIND_GET,
            Self::Set => KIND_SET,
            Self::Unrecognized(kind) => kind,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RequestKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Cookie lifetime requested by the app.
///
/// A number is a lifetime in days from the moment the value is stored; a
/// string is an absolute RFC 3339 instant (what `Date` serializes to).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expiry {
    Days(f64),
    At(String),
}

/// Options for a `get` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetterOptions {
    /// Cookie name on the hub domain.
    pub cookie_name: String,
    /// Address the hub iframe is served from.
    pub iframe_url: String,
    /// Purge the stored cookie before reading it.
    #[serde(default)]
    pub reset_cookie: bool,
    /// Seed data, only consulted when no cookie is stored yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<Expiry>,
}

/// Options for a `set` request.  `data` is mandatory (it may be JSON `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetterOptions {
    pub cookie_name: String,
    pub iframe_url: String,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<Expiry>,
}

/// Request configuration, resolved against the request kind at decode time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Config {
    Getter(GetterOptions),
    Setter(SetterOptions),
}

impl Config {
    pub fn cookie_name(&self) -> &str {
        match self {
            Self::Getter(o) => &o.cookie_name,
            Self::Setter(o) => &o.cookie_name,
        }
    }

    pub fn iframe_url(&self) -> &str {
        match self {
            Self::Getter(o) => &o.iframe_url,
            Self::Setter(o) => &o.iframe_url,
        }
    }

    /// The data carried by the request: the value to persist for a setter,
    /// or the optional seed for a getter.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Getter(o) => o.data.as_ref(),
            Self::Setter(o) => Some(&o.data),
        }
    }

    pub fn expires(&self) -> Option<&Expiry> {
        match self {
            Self::Getter(o) => o.expires.as_ref(),
            Self::Setter(o) => o.expires.as_ref(),
        }
    }

    /// `true` only for a getter that asked for the cookie to be purged.
    pub fn reset_cookie(&self) -> bool {
        matches!(self, Self::Getter(o) if o.reset_cookie)
    }
}

/// A fully decoded request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Logical name of the state being read or written; echoed on the response.
    pub data_key: String,
    pub kind: RequestKind,
    pub config: Config,
}

impl Request {
    pub fn get(data_key: impl Into<String>, options: GetterOptions) -> Self {
        Self {
            data_key: data_key.into(),
            kind: RequestKind::Get,
            config: Config::Getter(options),
        }
    }

    pub fn set(data_key: impl Into<String>, options: SetterOptions) -> Self {
        Self {
            data_key: data_key.into(),
            kind: RequestKind::Set,
            config: Config::Setter(options),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn getter() -> GetterOptions {
        GetterOptions {
            cookie_name: "uid".to_string(),
            iframe_url: "https://hub.example.com/iframe.html".to_string(),
            reset_cookie: false,
            data: None,
            expires: None,
        }
    }

    #[test]
    fn test_request_kind_from_wire() {
        assert_eq!(RequestKind::from_wire("get"), RequestKind::Get);
        assert_eq!(RequestKind::from_wire("set"), RequestKind::Set);
        assert_eq!(
            RequestKind::from_wire("GET"),
            RequestKind::Unrecognized("GET".to_string())
        );
    }

    #[test]
    fn test_request_kind_serializes_as_literal() {
        let json = serde_json::to_string(&RequestKind::Unrecognized("peek".into())).unwrap();
        assert_eq!(json, r#""peek""#);
    }

    #[test]
    fn test_getter_config_accessors() {
        let mut options = getter();
        options.reset_cookie = true;
        options.data = Some(json!({"seed": 1}));
        let config = Config::Getter(options);

        assert_eq!(config.cookie_name(), "uid");
        assert!(config.reset_cookie());
        assert_eq!(config.data(), Some(&json!({"seed": 1})));
    }

    #[test]
    fn test_setter_never_reports_reset() {
        let config = Config::Setter(SetterOptions {
            cookie_name: "uid".to_string(),
            iframe_url: "https://hub.example.com".to_string(),
            data: Value::Null,
            expires: Some(Expiry::Days(7.0)),
        });
        assert!(!config.reset_cookie());
        assert_eq!(config.data(), Some(&Value::Null));
        assert_eq!(config.expires(), Some(&Expiry::Days(7.0)));
    }

    #[test]
    fn test_request_serializes_with_camel_case_fields() {
        let request = Request::get("visitor", getter());
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["dataKey"], "visitor");
        assert_eq!(value["kind"], "get");
        assert_eq!(value["config"]["cookieName"], "uid");
        assert!(value["config"].get("data").is_none());
    }

    #[test]
    fn test_expiry_accepts_number_or_string() {
        let days: Expiry = serde_json::from_str("30").unwrap();
        let at: Expiry = serde_json::from_str(r#""2030-01-01T00:00:00Z""#).unwrap();
        assert_eq!(days, Expiry::Days(30.0));
        assert_eq!(at, Expiry::At("2030-01-01T00:00:00Z".to_string()));
    }
}
