//! Shared fixtures: a scripted upstream client and context wiring.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use llmgate_common::{GatewayResponse, Headers, RequestPayload, UpstreamRequest, header_set};
use llmgate_config::Target;
use llmgate_core::{
    GatewayContext, MemoryLogSink, TransportError, TransportErrorKind, UpstreamClient,
};
use llmgate_provider::ProviderRegistry;

#[derive(Clone)]
pub enum Reply {
    Json {
        status: u16,
        body: Value,
        headers: Vec<(String, String)>,
    },
    Transport(TransportErrorKind),
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Reply::Json {
            status,
            body,
            headers: Vec::new(),
        }
    }

    pub fn json_with_headers(status: u16, body: Value, headers: &[(&str, &str)]) -> Self {
        Reply::Json {
            status,
            body,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Upstream client that replays a scripted reply sequence, then falls back
/// to a fixed reply. Records every request it sees.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: AtomicUsize,
    requests: Mutex<Vec<UpstreamRequest>>,
}

impl ScriptedClient {
    pub fn always(status: u16, body: Value) -> Self {
        Self::sequence(Vec::new(), Reply::json(status, body))
    }

    pub fn sequence(script: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamClient for ScriptedClient {
    async fn send(
        &self,
        request: &UpstreamRequest,
        _request_timeout: Option<Duration>,
    ) -> Result<GatewayResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match reply {
            Reply::Json {
                status,
                body,
                headers,
            } => {
                let mut response = GatewayResponse::json(status, &body);
                for (name, value) in headers {
                    response = response.with_header(name, value);
                }
                Ok(response)
            }
            Reply::Transport(kind) => Err(TransportError {
                kind,
                message: "scripted transport failure".to_string(),
            }),
        }
    }
}

pub fn context_with(client: Arc<ScriptedClient>) -> (GatewayContext, Arc<MemoryLogSink>) {
    let logs = Arc::new(MemoryLogSink::new());
    let ctx = GatewayContext::new(Arc::new(ProviderRegistry::with_defaults()), client)
        .with_logs(logs.clone());
    (ctx, logs)
}

pub fn openai_target() -> Target {
    Target {
        provider: Some("openai".to_string()),
        api_key: Some("sk-test".to_string()),
        ..Target::default()
    }
}

pub fn json_payload() -> RequestPayload {
    RequestPayload::Json(json!({"model": "gpt-4", "messages": []}))
}

pub fn client_headers() -> Headers {
    let mut headers = Headers::new();
    header_set(&mut headers, "content-type", "application/json");
    headers
}
