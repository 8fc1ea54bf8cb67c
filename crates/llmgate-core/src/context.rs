use std::env;
use std::sync::Arc;

use arc_swap::ArcSwap;

use llmgate_hooks::{HooksService, NoopHooks};
use llmgate_provider::ProviderRegistry;

use crate::breaker::CircuitBreakerSink;
use crate::cache::{CacheStore, NoopCache};
use crate::conditional::{ConditionalRouter, QueryConditionalRouter};
use crate::logs::{LogSink, NoopLogSink};
use crate::upstream::UpstreamClient;
use crate::validate::RequestValidator;

const CUSTOM_HEADERS_TO_IGNORE: &str = "CUSTOM_HEADERS_TO_IGNORE";

/// Hot-swappable proxy-mode settings: the extra client header names dropped
/// in passthrough, seeded from `CUSTOM_HEADERS_TO_IGNORE`.
pub struct ProxySettings {
    ignored_proxy_headers: ArcSwap<Vec<String>>,
}

impl ProxySettings {
    pub fn from_env() -> Self {
        let ignored = env::var(CUSTOM_HEADERS_TO_IGNORE)
            .map(|raw| {
                raw.split(',')
                    .map(|name| name.trim().to_ascii_lowercase())
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            ignored_proxy_headers: ArcSwap::from_pointee(ignored),
        }
    }

    pub fn ignored_proxy_headers(&self) -> Arc<Vec<String>> {
        self.ignored_proxy_headers.load_full()
    }

    pub fn set_ignored_proxy_headers(&self, names: Vec<String>) {
        self.ignored_proxy_headers.store(Arc::new(
            names.into_iter().map(|n| n.to_ascii_lowercase()).collect(),
        ));
    }
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Per-deployment collaborator handles the routing core executes against.
/// Everything behind an `Arc<dyn ...>` is a thread-safe black box shared
/// across requests.
#[derive(Clone)]
pub struct GatewayContext {
    pub registry: Arc<ProviderRegistry>,
    pub client: Arc<dyn UpstreamClient>,
    pub hooks: Arc<dyn HooksService>,
    pub cache: Arc<dyn CacheStore>,
    pub breaker: Option<Arc<dyn CircuitBreakerSink>>,
    pub conditional_router: Arc<dyn ConditionalRouter>,
    pub validator: Option<Arc<dyn RequestValidator>>,
    pub logs: Arc<dyn LogSink>,
    pub settings: Arc<ProxySettings>,
}

impl GatewayContext {
    pub fn new(registry: Arc<ProviderRegistry>, client: Arc<dyn UpstreamClient>) -> Self {
        Self {
            registry,
            client,
            hooks: Arc::new(NoopHooks::new()),
            cache: Arc::new(NoopCache),
            breaker: None,
            conditional_router: Arc::new(QueryConditionalRouter),
            validator: None,
            logs: Arc::new(NoopLogSink),
            settings: Arc::new(ProxySettings::from_env()),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn HooksService>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_breaker(mut self, breaker: Arc<dyn CircuitBreakerSink>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    pub fn with_conditional_router(mut self, router: Arc<dyn ConditionalRouter>) -> Self {
        self.conditional_router = router;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn RequestValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_logs(mut self, logs: Arc<dyn LogSink>) -> Self {
        self.logs = logs;
        self
    }
}
