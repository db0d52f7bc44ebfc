//! In-memory cookie storage and the standard route handlers built on it.
//!
//! This is the hub's reference persistence collaborator.  The broker only
//! sees the handlers as opaque [`RouteHandler`]s; swapping the jar for a
//! different store does not touch the dispatch pipeline.
//!
//! # Stored values
//!
//! Cookies hold strings.  Request data arrives as arbitrary JSON, so it is
//! flattened before storage: a JSON string is stored verbatim, any other
//! value as its JSON text.
//!
//! # Routes
//!
//! | Route        | Behaviour                                                |
//! |--------------|----------------------------------------------------------|
//! | generic get  | optional reset, then stored value, else seed, else null  |
//! | set          | store `data` (null deletes), reply with stored value     |
//! | data getter  | like get, but a miss calls a [`DataGetter`] for the value|

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use async_trait::async_trait;
use hub_core::{Config, Expiry, Response};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::application::handler::{RouteHandler, SharedHandler};
use crate::application::router::RouteTable;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone)]
struct StoredCookie {
    value: String,
    expires_at: Option<OffsetDateTime>,
}

impl StoredCookie {
    fn is_live(&self, now: OffsetDateTime) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Thread-safe cookie storage keyed by cookie name.
///
/// Expired cookies behave as absent and are purged when read.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: Mutex<HashMap<String, StoredCookie>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoredCookie>> {
        // A panic while holding the lock cannot leave the map half-written:
        // every critical section is a single insert/remove/get.
        self.cookies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the live value of `name`, purging it if it has expired.
    pub fn get(&self, name: &str) -> Option<String> {
        let now = OffsetDateTime::now_utc();
        let mut cookies = self.lock();
        match cookies.get(name) {
            Some(cookie) if cookie.is_live(now) => Some(cookie.value.clone()),
            Some(_) => {
                cookies.remove(name);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `name`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Fails if `expires` is an unparseable instant or an out-of-range
    /// lifetime.
    pub fn set(&self, name: &str, value: String, expires: Option<&Expiry>) -> anyhow::Result<()> {
        let expires_at = expires.map(resolve_expiry).transpose()?;
        self.lock()
            .insert(name.to_string(), StoredCookie { value, expires_at });
        Ok(())
    }

    /// Deletes `name`; returns whether a value was stored.
    pub fn remove(&self, name: &str) -> bool {
        self.lock().remove(name).is_some()
    }
}

fn resolve_expiry(expiry: &Expiry) -> anyhow::Result<OffsetDateTime> {
    match expiry {
        Expiry::Days(days) => {
            let lifetime = time::Duration::checked_seconds_f64(days * SECONDS_PER_DAY)
                .with_context(|| format!("invalid cookie lifetime: {days} days"))?;
            OffsetDateTime::now_utc()
                .checked_add(lifetime)
                .with_context(|| format!("invalid cookie lifetime: {days} days"))
        }
        Expiry::At(instant) => OffsetDateTime::parse(instant, &Rfc3339)
            .with_context(|| format!("invalid cookie expiry: {instant}")),
    }
}

/// Flattens request data into the string stored in a cookie.
fn stringify(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Generic routes ────────────────────────────────────────────────────────────

/// Serves `get` requests for any cookie named in the request.
pub struct GetCookieHandler {
    jar: Arc<CookieJar>,
}

impl GetCookieHandler {
    pub fn new(jar: Arc<CookieJar>) -> Self {
        Self { jar }
    }
}

#[async_trait]
impl RouteHandler for GetCookieHandler {
    async fn handle(&self, data_key: String, config: Config) -> anyhow::Result<Response> {
        let name = config.cookie_name();
        if config.reset_cookie() {
            self.jar.remove(name);
        }
        if let Some(value) = self.jar.get(name) {
            return Ok(Response::success(data_key, Some(value)));
        }
        match config.data().filter(|seed| !seed.is_null()) {
            Some(seed) => {
                let value = stringify(seed);
                self.jar.set(name, value.clone(), config.expires())?;
                Ok(Response::success(data_key, Some(value)))
            }
            None => Ok(Response::success(data_key, None)),
        }
    }
}

/// Serves every `set` request.
pub struct SetCookieHandler {
    jar: Arc<CookieJar>,
}

impl SetCookieHandler {
    pub fn new(jar: Arc<CookieJar>) -> Self {
        Self { jar }
    }
}

#[async_trait]
impl RouteHandler for SetCookieHandler {
    async fn handle(&self, data_key: String, config: Config) -> anyhow::Result<Response> {
        let name = config.cookie_name();
        match config.data() {
            None | Some(Value::Null) => {
                self.jar.remove(name);
                Ok(Response::success(data_key, None))
            }
            Some(data) => {
                let value = stringify(data);
                self.jar.set(name, value.clone(), config.expires())?;
                Ok(Response::success(data_key, Some(value)))
            }
        }
    }
}

// ── Data-getter routes ────────────────────────────────────────────────────────

/// Produces the value for a cookie that is not stored yet.
///
/// Receives the seed data of the request, if any.
#[async_trait]
pub trait DataGetter: Send + Sync {
    async fn fetch(&self, seed: Option<Value>) -> anyhow::Result<String>;
}

/// A cookie whose value is produced on demand by a [`DataGetter`].
#[derive(Clone)]
pub struct CookieSpec {
    /// Data key the custom route is registered under.
    pub data_key: String,
    /// Cookie name on the hub domain.
    pub cookie_name: String,
    pub getter: Arc<dyn DataGetter>,
    /// Lifetime applied when the getter's value is stored.
    pub expires: Option<Expiry>,
}

/// Custom route backed by a [`DataGetter`].
pub struct DataGetterHandler {
    jar: Arc<CookieJar>,
    spec: CookieSpec,
}

impl DataGetterHandler {
    pub fn new(jar: Arc<CookieJar>, spec: CookieSpec) -> Self {
        Self { jar, spec }
    }
}

#[async_trait]
impl RouteHandler for DataGetterHandler {
    async fn handle(&self, data_key: String, config: Config) -> anyhow::Result<Response> {
        let name = self.spec.cookie_name.as_str();
        if config.reset_cookie() {
            self.jar.remove(name);
        }
        if let Some(value) = self.jar.get(name) {
            return Ok(Response::success(data_key, Some(value)));
        }
        let value = self.spec.getter.fetch(config.data().cloned()).await?;
        self.jar.set(name, value.clone(), self.spec.expires.as_ref())?;
        Ok(Response::success(data_key, Some(value)))
    }
}

/// Builds the route table the hub serves: generic get/set plus one custom
/// route per [`CookieSpec`].
pub fn cookie_routes(jar: Arc<CookieJar>, specs: impl IntoIterator<Item = CookieSpec>) -> RouteTable {
    let getter: SharedHandler = Arc::new(GetCookieHandler::new(Arc::clone(&jar)));
    let setter: SharedHandler = Arc::new(SetCookieHandler::new(Arc::clone(&jar)));
    specs.into_iter().fold(
        RouteTable::new().with_getter(getter).with_setter(setter),
        |table, spec| {
            let data_key = spec.data_key.clone();
            let handler: SharedHandler = Arc::new(DataGetterHandler::new(Arc::clone(&jar), spec));
            table.with_custom(data_key, handler)
        },
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
