//! Responses posted back to the dependent app.
//!
//! Every response carries the `dataKey` of the request that produced it so
//! the parent page can correlate replies that arrive out of order.  The one
//! exception is the origin-rejection failure, which has an empty `dataKey`
//! because no request was ever decoded.

use serde::{Deserialize, Serialize};

/// Fixed text of the origin-rejection failure.
///
/// Deliberately generic: an untrusted caller learns nothing about which
/// routes exist.
pub const NOT_ALLOWED_MESSAGE: &str = "Not allowed to perform this operation.";

/// Outcome of one request.
///
/// ```json
/// {"dataKey":"visitor","data":"abc123"}
/// {"dataKey":"visitor","data":null}
/// {"dataKey":"visitor","error":"cookie store unavailable"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
// Untagged: the presence of `error` is the discriminant.  `Failure` is listed
// first because a failure object would otherwise also satisfy `Success`
// (whose `data` field defaults to null).
#[serde(untagged)]
pub enum Response {
    Failure {
        #[serde(rename = "dataKey")]
        data_key: String,
        error: String,
    },
    Success {
        #[serde(rename = "dataKey")]
        data_key: String,
        data: Option<String>,
    },
}

impl Response {
    pub fn success(data_key: impl Into<String>, data: Option<String>) -> Self {
        Self::Success {
            data_key: data_key.into(),
            data,
        }
    }

    pub fn failure(data_key: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Failure {
            data_key: data_key.into(),
            error: error.into(),
        }
    }

    /// The reply sent to a sender that is not on the allow-list.
    pub fn not_allowed() -> Self {
        Self::failure("", NOT_ALLOWED_MESSAGE)
    }

    pub fn data_key(&self) -> &str {
        match self {
            Self::Failure { data_key, .. } | Self::Success { data_key, .. } => data_key,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_serializes_null_data() {
        let json = serde_json::to_string(&Response::success("k", None)).unwrap();
        assert_eq!(json, r#"{"dataKey":"k","data":null}"#);
    }

    #[test]
    fn test_failure_serializes_without_data_field() {
        let json = serde_json::to_string(&Response::failure("k", "boom")).unwrap();
        assert_eq!(json, r#"{"dataKey":"k","error":"boom"}"#);
    }

    #[test]
    fn test_not_allowed_has_empty_data_key() {
        let response = Response::not_allowed();
        assert_eq!(response.data_key(), "");
        assert_eq!(
            response,
            Response::failure("", "Not allowed to perform this operation.")
        );
    }

    #[test]
    fn test_failure_json_decodes_as_failure() {
        let response: Response = serde_json::from_str(r#"{"dataKey":"k","error":"x"}"#).unwrap();
        assert!(response.is_failure());
    }

    #[test]
    fn test_success_json_decodes_as_success() {
        let response: Response = serde_json::from_str(r#"{"dataKey":"k","data":"v"}"#).unwrap();
        assert_eq!(response, Response::success("k", Some("v".to_string())));
    }
}
