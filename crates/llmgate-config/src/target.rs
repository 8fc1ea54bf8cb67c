use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::policy::{CacheConfig, RetryConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyMode {
    Single,
    Fallback,
    Loadbalance,
    Conditional,
}

/// One conditional-routing rule: a query over `{metadata, params}` and the
/// name (or index) of the child to route to when it matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteCondition {
    #[serde(default)]
    pub query: Value,
    #[serde(rename = "then", default)]
    pub then_target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StrategySpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<StrategyMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_status_codes: Option<Vec<u16>>,
    /// Conditional-routing rules; the key keeps its authored spelling so the
    /// query DSL inside survives camelCase normalization.
    #[serde(rename = "conditions", skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<RouteCondition>>,
    /// Child routed to when no condition matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// A node in the routing tree: either an inner strategy node with `targets`
/// or a leaf provider node. Leaf fields on an inner node only serve as an
/// inheritance source.
///
/// Provider-specific fields (resource names, AWS credentials, ...) stay in
/// the flattened `extras` map; `typed_options` materializes the per-provider
/// view on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Target {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategySpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<Target>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(
        rename = "override_params",
        alias = "overrideParams",
        skip_serializing_if = "Option::is_none"
    )]
    pub override_params: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,
    /// Upstream fetch bound, milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_headers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_request_hooks: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_request_hooks: Option<Vec<Value>>,
    #[serde(
        rename = "input_guardrails",
        alias = "inputGuardrails",
        skip_serializing_if = "Option::is_none"
    )]
    pub input_guardrails: Option<Vec<Value>>,
    #[serde(
        rename = "output_guardrails",
        alias = "outputGuardrails",
        skip_serializing_if = "Option::is_none"
    )]
    pub output_guardrails: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_mutators: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_mutators: Option<Vec<Value>>,
    #[serde(
        rename = "default_input_guardrails",
        alias = "defaultInputGuardrails",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_input_guardrails: Option<Vec<Value>>,
    #[serde(
        rename = "default_output_guardrails",
        alias = "defaultOutputGuardrails",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_output_guardrails: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_open_ai_compliance: Option<bool>,

    /// Circuit-breaker identity; when inherited, leaf outcomes are reported
    /// back to the breaker under this id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "cb_config", alias = "cbConfig", skip_serializing_if = "Option::is_none")]
    pub cb_config: Option<Value>,
    /// Stamped by the breaker's upstream filter; open children are skipped
    /// while at least one healthy sibling remains.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,

    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl Target {
    pub fn is_strategy_node(&self) -> bool {
        self.strategy.as_ref().is_some_and(|s| s.mode.is_some()) && self.targets.is_some()
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Deserialize the provider-specific view of the extras map. Unknown
    /// fields are ignored and missing ones default, so this never fails for
    /// the option structs in [`crate::options`].
    pub fn typed_options<T>(&self) -> T
    where
        T: serde::de::DeserializeOwned + Default,
    {
        serde_json::from_value(Value::Object(self.extras.clone())).unwrap_or_default()
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extras.get(key).and_then(Value::as_str)
    }
}
