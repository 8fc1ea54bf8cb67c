use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use llmgate_common::GatewayResponse;

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_COOLDOWN_MS: u64 = 30_000;

/// Circuit-breaker collaborator. The resolver reports every leaf outcome
/// under the inherited breaker id; an upstream filter stamps `is_open` onto
/// children before the walk.
#[async_trait]
pub trait CircuitBreakerSink: Send + Sync {
    async fn record(
        &self,
        response: &GatewayResponse,
        id: &str,
        cb_config: Option<&Value>,
        json_path: &str,
    );

    fn is_open(&self, id: &str) -> bool;
}

struct BreakerState {
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    cooldown: Duration,
}

/// Trips after a configured number of consecutive qualifying failures and
/// recovers once the cooldown elapses.
///
/// `cb_config` shape: `{"failure_threshold": n, "cooldown_ms": m,
/// "failure_status_codes": [...]}`, all optional.
#[derive(Default)]
pub struct FailureWindowBreaker {
    states: Mutex<HashMap<String, BreakerState>>,
}

impl FailureWindowBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_failure(response: &GatewayResponse, cb_config: Option<&Value>) -> bool {
        if let Some(codes) = cb_config
            .and_then(|c| c.get("failure_status_codes"))
            .and_then(Value::as_array)
        {
            return codes
                .iter()
                .filter_map(Value::as_u64)
                .any(|code| code == response.status as u64);
        }
        response.status >= 500
    }
}

#[async_trait]
impl CircuitBreakerSink for FailureWindowBreaker {
    async fn record(
        &self,
        response: &GatewayResponse,
        id: &str,
        cb_config: Option<&Value>,
        json_path: &str,
    ) {
        let threshold = cb_config
            .and_then(|c| c.get("failure_threshold"))
            .and_then(Value::as_u64)
            .map(|n| n as u32)
            .unwrap_or(DEFAULT_FAILURE_THRESHOLD);
        let cooldown = cb_config
            .and_then(|c| c.get("cooldown_ms"))
            .and_then(Value::as_u64)
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_COOLDOWN_MS));
        let failed = Self::is_failure(response, cb_config);

        let Ok(mut guard) = self.states.lock() else {
            return;
        };
        let state = guard.entry(id.to_string()).or_insert(BreakerState {
            consecutive_failures: 0,
            opened_at: None,
            cooldown,
        });
        if failed {
            state.consecutive_failures += 1;
            state.cooldown = cooldown;
            if state.consecutive_failures >= threshold && state.opened_at.is_none() {
                tracing::warn!(
                    event = "circuit_opened",
                    breaker = %id,
                    path = %json_path,
                    failures = state.consecutive_failures,
                );
                state.opened_at = Some(Instant::now());
            }
        } else {
            state.consecutive_failures = 0;
            state.opened_at = None;
        }
    }

    fn is_open(&self, id: &str) -> bool {
        let Ok(mut guard) = self.states.lock() else {
            return false;
        };
        let Some(state) = guard.get_mut(id) else {
            return false;
        };
        match state.opened_at {
            Some(opened) if opened.elapsed() < state.cooldown => true,
            Some(_) => {
                state.opened_at = None;
                state.consecutive_failures = 0;
                false
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16) -> GatewayResponse {
        GatewayResponse::json(status, &json!({}))
    }

    #[tokio::test]
    async fn opens_after_threshold_and_recovers_after_cooldown() {
        let breaker = FailureWindowBreaker::new();
        let config = json!({"failure_threshold": 2, "cooldown_ms": 20});

        breaker.record(&response(502), "t1", Some(&config), "").await;
        assert!(!breaker.is_open("t1"));
        breaker.record(&response(502), "t1", Some(&config), "").await;
        assert!(breaker.is_open("t1"));

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!breaker.is_open("t1"));
    }

    #[tokio::test]
    async fn success_resets_the_window() {
        let breaker = FailureWindowBreaker::new();
        let config = json!({"failure_threshold": 2});

        breaker.record(&response(500), "t1", Some(&config), "").await;
        breaker.record(&response(200), "t1", Some(&config), "").await;
        breaker.record(&response(500), "t1", Some(&config), "").await;
        assert!(!breaker.is_open("t1"));
    }
}
