use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use time::OffsetDateTime;

use llmgate_common::{GatewayResponse, Headers};
use llmgate_config::CacheConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Disabled,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct CacheOutcome {
    pub response: Option<GatewayResponse>,
    pub status: CacheStatus,
    pub key: Option<String>,
    pub created_at: Option<OffsetDateTime>,
}

impl CacheOutcome {
    /// No cache configured for this target: reported as a plain miss so log
    /// records stay uniform.
    pub fn miss() -> Self {
        Self {
            response: None,
            status: CacheStatus::Miss,
            key: None,
            created_at: None,
        }
    }
}

/// Cache collaborator contract. Lookups run before the upstream fetch;
/// writes are fire-and-forget and happen only after a main-path success.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn lookup(
        &self,
        request_url: &str,
        params: &Value,
        config: Option<&CacheConfig>,
    ) -> CacheOutcome;

    async fn write(
        &self,
        key: &str,
        status: u16,
        headers: &Headers,
        body: &Bytes,
        config: &CacheConfig,
    );
}

pub struct NoopCache;

#[async_trait]
impl CacheStore for NoopCache {
    async fn lookup(
        &self,
        _request_url: &str,
        _params: &Value,
        _config: Option<&CacheConfig>,
    ) -> CacheOutcome {
        CacheOutcome::miss()
    }

    async fn write(
        &self,
        _key: &str,
        _status: u16,
        _headers: &Headers,
        _body: &Bytes,
        _config: &CacheConfig,
    ) {
    }
}

struct CacheEntry {
    status: u16,
    headers: Headers,
    body: Bytes,
    stored_at: Instant,
    stored_at_wall: OffsetDateTime,
    max_age: Option<Duration>,
}

/// In-process cache keyed by a blake3 digest over the request URL and
/// parameters. Freshness honors the reader's `max_age` when set, otherwise
/// the writer's.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_key(request_url: &str, params: &Value) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(request_url.as_bytes());
        hasher.update(b"\0");
        hasher.update(params.to_string().as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn lookup(
        &self,
        request_url: &str,
        params: &Value,
        config: Option<&CacheConfig>,
    ) -> CacheOutcome {
        let Some(config) = config else {
            return CacheOutcome::miss();
        };
        let key = Self::cache_key(request_url, params);

        let Ok(mut guard) = self.entries.lock() else {
            return CacheOutcome::miss();
        };
        if let Some(entry) = guard.get(&key) {
            let max_age = config
                .max_age
                .map(Duration::from_secs)
                .or(entry.max_age);
            let fresh = max_age.is_none_or(|age| entry.stored_at.elapsed() <= age);
            if fresh {
                return CacheOutcome {
                    response: Some(GatewayResponse::new(
                        entry.status,
                        entry.headers.clone(),
                        entry.body.clone(),
                    )),
                    status: CacheStatus::Hit,
                    key: Some(key),
                    created_at: Some(entry.stored_at_wall),
                };
            }
            guard.remove(&key);
        }
        CacheOutcome {
            response: None,
            status: CacheStatus::Miss,
            key: Some(key),
            created_at: None,
        }
    }

    async fn write(
        &self,
        key: &str,
        status: u16,
        headers: &Headers,
        body: &Bytes,
        config: &CacheConfig,
    ) {
        let entry = CacheEntry {
            status,
            headers: headers.clone(),
            body: body.clone(),
            stored_at: Instant::now(),
            stored_at_wall: OffsetDateTime::now_utc(),
            max_age: config.max_age.map(Duration::from_secs),
        };
        if let Ok(mut guard) = self.entries.lock() {
            guard.insert(key.to_string(), entry);
        }
    }
}
