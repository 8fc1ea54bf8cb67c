use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use llmgate_common::GatewayError;

use crate::model::HookStage;
use crate::span::{HookSpan, SpanStore};

/// Result of one hook phase. `results` holds one entry per executed hook in
/// the runtime's wire shape (`{id, type, verdict, deny, checks: [...]}`).
#[derive(Debug, Default)]
pub struct HookPhaseOutcome {
    pub results: Vec<Value>,
    pub should_deny: bool,
    /// An input-stage check rewrote the request payload (now on the span).
    pub transformed: bool,
    /// Output-stage rewrite of the response payload, when one happened.
    pub response_json: Option<Value>,
}

pub struct CheckContext<'a> {
    pub stage: HookStage,
    pub request_json: &'a Value,
    pub response_json: Option<&'a Value>,
    pub response_status: Option<u16>,
    pub parameters: &'a Value,
}

#[derive(Debug, Default)]
pub struct CheckVerdict {
    pub verdict: bool,
    pub data: Option<Value>,
    pub transformed_request: Option<Value>,
    pub transformed_response: Option<Value>,
}

impl CheckVerdict {
    pub fn pass() -> Self {
        Self {
            verdict: true,
            ..Self::default()
        }
    }

    pub fn fail() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// One registered check implementation, addressed by the check id inside a
/// hook's `checks[]` (e.g. `default.wordCount`). The evaluation DSL behind
/// an id is the embedder's business.
#[async_trait]
pub trait CheckEvaluator: Send + Sync {
    fn id(&self) -> &str;

    async fn evaluate(&self, ctx: CheckContext<'_>) -> Result<CheckVerdict, GatewayError>;
}

/// Hook runtime contract the request processor consumes.
///
/// Before-hook evaluation failures are swallowed (logged, request proceeds);
/// after-hook failures propagate to the caller.
#[async_trait]
pub trait HooksService: Send + Sync {
    fn open_span(&self, request_json: Value, before: Vec<Value>, after: Vec<Value>) -> HookSpan;

    fn span(&self, id: &str) -> Option<HookSpan>;

    /// Whether any synchronous after-hook is bound to the span; decides if
    /// the response body gets parsed at all.
    fn has_sync_after_hooks(&self, id: &str) -> bool;

    async fn run_before_request_hooks(&self, id: &str) -> HookPhaseOutcome;

    async fn run_after_request_hooks(
        &self,
        id: &str,
        response_json: Option<&Value>,
        response_status: u16,
    ) -> Result<HookPhaseOutcome, GatewayError>;

    fn close_span(&self, id: &str);
}

/// Hook runtime that evaluates nothing; spans still exist so the pipeline's
/// bookkeeping works unchanged.
#[derive(Default)]
pub struct NoopHooks {
    store: SpanStore,
}

impl NoopHooks {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HooksService for NoopHooks {
    fn open_span(&self, request_json: Value, before: Vec<Value>, after: Vec<Value>) -> HookSpan {
        self.store.create(request_json, before, after)
    }

    fn span(&self, id: &str) -> Option<HookSpan> {
        self.store.get(id)
    }

    fn has_sync_after_hooks(&self, _id: &str) -> bool {
        false
    }

    async fn run_before_request_hooks(&self, _id: &str) -> HookPhaseOutcome {
        HookPhaseOutcome::default()
    }

    async fn run_after_request_hooks(
        &self,
        _id: &str,
        _response_json: Option<&Value>,
        _response_status: u16,
    ) -> Result<HookPhaseOutcome, GatewayError> {
        Ok(HookPhaseOutcome::default())
    }

    fn close_span(&self, id: &str) {
        self.store.release(id);
    }
}

/// In-process hook runtime: spans in a shared store, checks resolved against
/// registered evaluators.
#[derive(Default)]
pub struct HooksManager {
    store: SpanStore,
    evaluators: HashMap<String, Arc<dyn CheckEvaluator>>,
}

impl HooksManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, evaluator: Arc<dyn CheckEvaluator>) {
        self.evaluators.insert(evaluator.id().to_string(), evaluator);
    }

    async fn run_phase(
        &self,
        span: &HookSpan,
        stage: HookStage,
        response_json: Option<&Value>,
        response_status: Option<u16>,
        swallow_errors: bool,
    ) -> Result<HookPhaseOutcome, GatewayError> {
        let hooks = match stage {
            HookStage::Input => &span.before_hooks,
            HookStage::Output => &span.after_hooks,
        };

        let mut results = Vec::new();
        let mut should_deny = false;
        let mut request_transformed = false;
        let mut response_transformed = false;
        let mut request_json = span.request_json.clone();
        let mut response_out = response_json.cloned();

        for hook in hooks {
            let Some(hook_obj) = hook.as_object() else {
                continue;
            };
            let deny = hook_obj.get("deny").and_then(Value::as_bool).unwrap_or(false);
            let is_async = hook_obj.get("async").and_then(Value::as_bool).unwrap_or(false);
            let empty = Vec::new();
            let checks = hook_obj
                .get("checks")
                .and_then(Value::as_array)
                .unwrap_or(&empty);

            let mut check_results = Vec::new();
            let mut verdict = true;
            for check in checks {
                let Some(check_id) = check.get("id").and_then(Value::as_str) else {
                    continue;
                };
                if check.get("is_enabled").and_then(Value::as_bool) == Some(false) {
                    continue;
                }
                let parameters = check.get("parameters").unwrap_or(&Value::Null);
                let Some(evaluator) = self.evaluators.get(check_id) else {
                    tracing::warn!(event = "hook_check_unresolved", check = %check_id);
                    check_results.push(json!({
                        "id": check_id,
                        "verdict": true,
                        "error": "no evaluator registered",
                    }));
                    continue;
                };

                let ctx = CheckContext {
                    stage,
                    request_json: &request_json,
                    response_json: response_out.as_ref(),
                    response_status,
                    parameters,
                };
                match evaluator.evaluate(ctx).await {
                    Ok(outcome) => {
                        if !outcome.verdict {
                            verdict = false;
                        }
                        if let Some(rewritten) = outcome.transformed_request {
                            request_json = rewritten;
                            request_transformed = true;
                        }
                        if let Some(rewritten) = outcome.transformed_response {
                            response_out = Some(rewritten);
                            response_transformed = true;
                        }
                        let mut entry = Map::new();
                        entry.insert("id".to_string(), json!(check_id));
                        entry.insert("verdict".to_string(), json!(outcome.verdict));
                        if let Some(data) = outcome.data {
                            entry.insert("data".to_string(), data);
                        }
                        check_results.push(Value::Object(entry));
                    }
                    Err(err) if swallow_errors => {
                        tracing::warn!(
                            event = "hook_check_failed",
                            check = %check_id,
                            error = %err,
                        );
                        check_results.push(json!({
                            "id": check_id,
                            "verdict": true,
                            "error": err.to_string(),
                        }));
                    }
                    Err(err) => return Err(err),
                }
            }

            if !verdict && deny && !is_async {
                should_deny = true;
            }
            results.push(json!({
                "id": hook_obj.get("id").cloned().unwrap_or(Value::Null),
                "type": hook_obj.get("type").cloned().unwrap_or(Value::Null),
                "verdict": verdict,
                "deny": deny,
                "async": is_async,
                "checks": check_results,
            }));
        }

        if request_transformed {
            let rewritten = request_json.clone();
            self.store.update(&span.id, |span| {
                span.request_json = rewritten;
                span.is_transformed = true;
            });
        }

        Ok(HookPhaseOutcome {
            results,
            should_deny,
            transformed: request_transformed,
            response_json: response_transformed.then_some(response_out).flatten(),
        })
    }
}

#[async_trait]
impl HooksService for HooksManager {
    fn open_span(&self, request_json: Value, before: Vec<Value>, after: Vec<Value>) -> HookSpan {
        self.store.create(request_json, before, after)
    }

    fn span(&self, id: &str) -> Option<HookSpan> {
        self.store.get(id)
    }

    fn has_sync_after_hooks(&self, id: &str) -> bool {
        self.store.get(id).is_some_and(|span| {
            span.after_hooks.iter().any(|hook| {
                hook.get("async").and_then(Value::as_bool) != Some(true)
            })
        })
    }

    async fn run_before_request_hooks(&self, id: &str) -> HookPhaseOutcome {
        let Some(span) = self.store.get(id) else {
            return HookPhaseOutcome::default();
        };
        // swallow_errors guarantees the Err arm is unreachable here
        self.run_phase(&span, HookStage::Input, None, None, true)
            .await
            .unwrap_or_default()
    }

    async fn run_after_request_hooks(
        &self,
        id: &str,
        response_json: Option<&Value>,
        response_status: u16,
    ) -> Result<HookPhaseOutcome, GatewayError> {
        let Some(span) = self.store.get(id) else {
            return Ok(HookPhaseOutcome::default());
        };
        self.run_phase(&span, HookStage::Output, response_json, Some(response_status), false)
            .await
    }

    fn close_span(&self, id: &str) {
        self.store.release(id);
    }
}
