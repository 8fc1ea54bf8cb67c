//! Rewrites compact guardrail/mutator declarations into the canonical hook
//! object consumed by the runtime.

use rand::Rng;
use serde_json::{Map, Value, json};

use llmgate_common::camel_case_keys;

use crate::model::{HookKind, HookStage};

/// Keys lifted from the shorthand onto the hook object itself; everything
/// left behind becomes a check.
const RESERVED_KEYS: &[&str] = &[
    "deny",
    "on_fail",
    "on_success",
    "async",
    "id",
    "type",
    "guardrail_version_id",
];

/// Expand an array of shorthand declarations.
///
/// Each shorthand becomes `{id, type, deny?, ..., checks: [...]}` where every
/// non-reserved key turns into a check: bare names are namespaced under
/// `default.`, dotted names pass through, and the check's parameters are the
/// shorthand value. The generated id carries a random base-36 suffix, so
/// callers must tolerate its shape rather than its value.
pub fn expand_shorthand(items: &[Value], stage: HookStage, kind: HookKind) -> Vec<Value> {
    items.iter().map(|item| expand_one(item, stage, kind)).collect()
}

fn expand_one(item: &Value, stage: HookStage, kind: HookKind) -> Value {
    let mut rest = item.as_object().cloned().unwrap_or_default();

    let mut hook = Map::new();
    hook.insert("type".to_string(), json!(kind.as_str()));
    hook.insert("id".to_string(), json!(shorthand_id(stage)));
    for key in RESERVED_KEYS {
        if let Some(value) = rest.remove(*key) {
            hook.insert((*key).to_string(), value);
        }
    }

    let mut hook = match camel_case_keys(Value::Object(hook), &[]) {
        Value::Object(map) => map,
        other => return other,
    };

    let checks: Vec<Value> = rest
        .into_iter()
        .map(|(key, parameters)| {
            let id = if key.contains('.') {
                key
            } else {
                format!("default.{key}")
            };
            let mut check = Map::new();
            check.insert("id".to_string(), Value::String(id));
            if let Some(enabled) = parameters.get("is_enabled").cloned() {
                check.insert("is_enabled".to_string(), enabled);
            }
            check.insert("parameters".to_string(), parameters);
            Value::Object(check)
        })
        .collect();
    hook.insert("checks".to_string(), Value::Array(checks));

    Value::Object(hook)
}

fn shorthand_id(stage: HookStage) -> String {
    format!("{}_guardrail_{}", stage.as_str(), random_suffix())
}

fn random_suffix() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    (0..3)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
