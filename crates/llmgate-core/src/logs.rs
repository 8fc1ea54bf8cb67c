use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use time::OffsetDateTime;

use llmgate_common::Headers;

use crate::cache::CacheStatus;

/// One emitted execution record. Terminal outcomes produce exactly one;
/// every intermediate retry inside the after-hook loop adds one more.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub span_id: Option<String>,
    pub json_path: String,
    pub provider: Option<String>,
    pub endpoint: String,
    pub method: String,
    pub request_url: Option<String>,
    pub request_headers: Headers,
    pub request_body: Option<Value>,
    pub response_status: Option<u16>,
    pub response_body: Option<Value>,
    pub original_response_body: Option<Value>,
    pub cache_status: Option<CacheStatus>,
    pub cache_key: Option<String>,
    /// Retry attempt index; `-1` means every attempt was exhausted without
    /// a non-retriable response.
    pub retry_attempt: i32,
    pub execution_ms: u128,
    pub created_at: OffsetDateTime,
}

/// Record transport is the embedder's concern; the core only emits.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: LogRecord);
}

pub struct NoopLogSink;

impl LogSink for NoopLogSink {
    fn emit(&self, _record: LogRecord) {}
}

/// Collecting sink for tests and local inspection.
#[derive(Default)]
pub struct MemoryLogSink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl LogSink for MemoryLogSink {
    fn emit(&self, record: LogRecord) {
        if let Ok(mut guard) = self.records.lock() {
            guard.push(record);
        }
    }
}

/// Accumulates request-side context over the pipeline, then stamps each
/// emission with the response side.
#[derive(Debug, Clone)]
pub struct LogObject {
    span_id: Option<String>,
    json_path: String,
    provider: Option<String>,
    endpoint: String,
    method: String,
    request_url: Option<String>,
    request_headers: Headers,
    request_body: Option<Value>,
    cache_status: Option<CacheStatus>,
    cache_key: Option<String>,
}

impl LogObject {
    pub fn new(
        json_path: impl Into<String>,
        provider: Option<String>,
        endpoint: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            span_id: None,
            json_path: json_path.into(),
            provider,
            endpoint: endpoint.into(),
            method: method.into(),
            request_url: None,
            request_headers: Headers::new(),
            request_body: None,
            cache_status: None,
            cache_key: None,
        }
    }

    pub fn set_span_id(&mut self, span_id: impl Into<String>) {
        self.span_id = Some(span_id.into());
    }

    pub fn set_request(&mut self, url: impl Into<String>, headers: &Headers, body: Option<Value>) {
        self.request_url = Some(url.into());
        self.request_headers = headers.clone();
        self.request_body = body;
    }

    pub fn set_cache(&mut self, status: CacheStatus, key: Option<String>) {
        self.cache_status = Some(status);
        self.cache_key = key;
    }

    pub fn emit(
        &self,
        sink: &dyn LogSink,
        response_status: Option<u16>,
        response_body: Option<Value>,
        original_response_body: Option<Value>,
        retry_attempt: i32,
        execution: Duration,
    ) {
        sink.emit(LogRecord {
            span_id: self.span_id.clone(),
            json_path: self.json_path.clone(),
            provider: self.provider.clone(),
            endpoint: self.endpoint.clone(),
            method: self.method.clone(),
            request_url: self.request_url.clone(),
            request_headers: self.request_headers.clone(),
            request_body: self.request_body.clone(),
            response_status,
            response_body,
            original_response_body,
            cache_status: self.cache_status,
            cache_key: self.cache_key.clone(),
            retry_attempt,
            execution_ms: execution.as_millis(),
            created_at: OffsetDateTime::now_utc(),
        });
    }
}
