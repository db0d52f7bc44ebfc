//! Route table and handler resolution.
//!
//! The table is a single mapping from route key to handler.  The keys `"set"`
//! and `"get"` name the generic setter and getter; any other key is a data
//! key.  Keys are unique, so registering a custom route for data key `"get"`
//! replaces the generic getter.  Resolution order, first match wins:
//!
//! 1. `kind == set` → the `"set"` entry, whatever the data key.
//! 2. the entry keyed by the request's data key.
//! 3. `kind == get` → the `"get"` entry.
//! 4. nothing.
//!
//! A data-key entry therefore shadows the generic getter for its key (and
//! also serves unrecognized kinds for that key) but never a `set`.  Because
//! rule 2 looks in the same mapping, a request whose data key is itself
//! `"get"` or `"set"` resolves to that generic entry.

use std::collections::HashMap;
use std::fmt;

use hub_core::domain::request::{KIND_GET, KIND_SET};
use hub_core::RequestKind;

use crate::application::handler::SharedHandler;

/// Which entry of the table served a request.  Used for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteName {
    Set,
    Get,
    Custom(String),
}

impl RouteName {
    fn for_key(key: &str) -> Self {
        match key {
            KIND_SET => Self::Set,
            KIND_GET => Self::Get,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set => f.write_str(KIND_SET),
            Self::Get => f.write_str(KIND_GET),
            Self::Custom(key) => write!(f, "custom:{key}"),
        }
    }
}

/// The broker's immutable route table.
///
/// Build it once at startup with the `with_*` methods and hand it to the
/// [`Broker`](crate::application::Broker); it is never modified afterwards.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, SharedHandler>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the route that serves every `set` request (key `"set"`).
    pub fn with_setter(self, handler: SharedHandler) -> Self {
        self.with_custom(KIND_SET, handler)
    }

    /// Registers the generic route for `get` requests (key `"get"`).
    pub fn with_getter(self, handler: SharedHandler) -> Self {
        self.with_custom(KIND_GET, handler)
    }

    /// Registers a route under `key`, replacing any previous entry with the
    /// same key.
    pub fn with_custom(mut self, key: impl Into<String>, handler: SharedHandler) -> Self {
        self.routes.insert(key.into(), handler);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolves the handler for a request.
    pub fn resolve(&self, kind: &RequestKind, data_key: &str) -> Option<(RouteName, SharedHandler)> {
        if *kind == RequestKind::Set {
            return self.entry(KIND_SET);
        }
        if let Some(found) = self.entry(data_key) {
            return Some(found);
        }
        if *kind == RequestKind::Get {
            return self.entry(KIND_GET);
        }
        None
    }

    fn entry(&self, key: &str) -> Option<(RouteName, SharedHandler)> {
        self.routes
            .get(key)
            .map(|handler| (RouteName::for_key(key), handler.clone()))
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.routes.keys().collect();
        keys.sort();
        f.debug_struct("RouteTable").field("keys", &keys).finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handler::handler_fn;
    use hub_core::{Config, GetterOptions, Response};

    fn config() -> Config {
        Config::Getter(GetterOptions {
            cookie_name: "c".into(),
            iframe_url: "u".into(),
            reset_cookie: false,
            data: None,
            expires: None,
        })
    }

    fn noop() -> SharedHandler {
        handler_fn(|key, _| async move { Ok(Response::success(key, None)) })
    }

    fn full_table() -> RouteTable {
        RouteTable::new()
            .with_setter(noop())
            .with_getter(noop())
            .with_custom("visitor", noop())
    }

    fn route(table: &RouteTable, kind: RequestKind, key: &str) -> Option<RouteName> {
        table.resolve(&kind, key).map(|(name, _)| name)
    }

    #[test]
    fn test_set_always_uses_setter_even_with_custom_key() {
        let table = full_table();
        assert_eq!(route(&table, RequestKind::Set, "visitor"), Some(RouteName::Set));
        assert_eq!(route(&table, RequestKind::Set, "other"), Some(RouteName::Set));
    }

    #[test]
    fn test_set_without_setter_does_not_fall_through() {
        let table = RouteTable::new().with_getter(noop()).with_custom("visitor", noop());
        assert_eq!(route(&table, RequestKind::Set, "visitor"), None);
    }

    #[test]
    fn test_custom_key_shadows_generic_getter() {
        let table = full_table();
        assert_eq!(
            route(&table, RequestKind::Get, "visitor"),
            Some(RouteName::Custom("visitor".into()))
        );
    }

    #[test]
    fn test_get_without_custom_key_uses_getter() {
        let table = full_table();
        assert_eq!(route(&table, RequestKind::Get, "prefs"), Some(RouteName::Get));
    }

    #[test]
    fn test_unrecognized_kind_with_custom_key_uses_custom_route() {
        let table = full_table();
        let kind = RequestKind::Unrecognized("peek".into());
        assert_eq!(route(&table, kind, "visitor"), Some(RouteName::Custom("visitor".into())));
    }

    #[test]
    fn test_unrecognized_kind_without_custom_key_has_no_route() {
        let table = full_table();
        let kind = RequestKind::Unrecognized("peek".into());
        assert_eq!(route(&table, kind, "prefs"), None);
    }

    #[test]
    fn test_get_without_getter_has_no_route() {
        let table = RouteTable::new().with_setter(noop());
        assert_eq!(route(&table, RequestKind::Get, "prefs"), None);
    }

    #[test]
    fn test_debug_lists_route_keys_only() {
        let rendered = format!("{:?}", full_table());
        assert!(rendered.contains(r#"keys: ["get", "set", "visitor"]"#));
    }

    #[test]
    fn test_empty_table() {
        assert!(RouteTable::new().is_empty());
        assert!(!full_table().is_empty());
    }

    #[test]
    fn test_data_key_get_resolves_to_generic_getter() {
        let table = RouteTable::new().with_getter(noop());
        let kind = RequestKind::Unrecognized("peek".into());
        assert_eq!(route(&table, kind, "get"), Some(RouteName::Get));
    }

    #[test]
    fn test_data_key_set_resolves_to_setter_for_get_kind() {
        let table = RouteTable::new().with_setter(noop());
        assert_eq!(route(&table, RequestKind::Get, "set"), Some(RouteName::Set));
    }

    #[test]
    fn test_custom_route_keyed_get_replaces_generic_getter() {
        // Arrange
        let replacement = handler_fn(|key, _| async move { Ok(Response::success(key, Some("custom".into()))) });
        let table = RouteTable::new().with_getter(noop()).with_custom("get", replacement);

        // Act
        let (name, handler) = table.resolve(&RequestKind::Get, "prefs").unwrap();
        let response = tokio_test::block_on(handler.handle("prefs".into(), config())).unwrap();

        // Assert
        assert_eq!(name, RouteName::Get);
        assert_eq!(response, Response::success("prefs", Some("custom".into())));
        assert_eq!(format!("{table:?}"), r#"RouteTable { keys: ["get"] }"#);
    }
}
