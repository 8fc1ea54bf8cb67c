use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use uuid::Uuid;

/// Per-leaf execution handle into the hook runtime. Carries the mutable
/// request payload hooks may rewrite and the flag saying they did.
#[derive(Debug, Clone)]
pub struct HookSpan {
    pub id: String,
    pub request_json: Value,
    pub is_transformed: bool,
    pub before_hooks: Vec<Value>,
    pub after_hooks: Vec<Value>,
}

/// Shared span registry. Spans are created before the before-hooks run and
/// released on terminal emission; accesses within one request are serialized
/// by the pipeline order.
#[derive(Default)]
pub struct SpanStore {
    spans: Mutex<HashMap<String, HookSpan>>,
}

impl SpanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        request_json: Value,
        before_hooks: Vec<Value>,
        after_hooks: Vec<Value>,
    ) -> HookSpan {
        let span = HookSpan {
            id: Uuid::new_v4().to_string(),
            request_json,
            is_transformed: false,
            before_hooks,
            after_hooks,
        };
        if let Ok(mut guard) = self.spans.lock() {
            guard.insert(span.id.clone(), span.clone());
        }
        span
    }

    pub fn get(&self, id: &str) -> Option<HookSpan> {
        self.spans.lock().ok()?.get(id).cloned()
    }

    pub fn update<F>(&self, id: &str, apply: F)
    where
        F: FnOnce(&mut HookSpan),
    {
        if let Ok(mut guard) = self.spans.lock()
            && let Some(span) = guard.get_mut(id)
        {
            apply(span);
        }
    }

    pub fn release(&self, id: &str) {
        if let Ok(mut guard) = self.spans.lock() {
            guard.remove(id);
        }
    }
}
