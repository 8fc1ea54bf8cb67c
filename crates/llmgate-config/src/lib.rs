//! Declarative routing configuration: the target tree, retry/cache policy,
//! and the header-driven config builder.

pub mod builder;
pub mod inherited;
pub mod options;
pub mod policy;
pub mod target;

pub use builder::{
    HEADER_CONFIG, HEADER_DEFAULT_INPUT_GUARDRAILS, HEADER_DEFAULT_OUTPUT_GUARDRAILS,
    HEADER_FILE_PURPOSE, HEADER_METADATA, HEADER_PREFIX, HEADER_PROVIDER,
    build_target_from_headers, strip_bearer,
};
pub use inherited::InheritedConfig;
pub use options::{
    AnthropicOptions, AwsOptions, AzureInferenceOptions, AzureOpenAiOptions, CortexOptions,
    FireworksOptions, HuggingfaceOptions, OpenAiOptions, SagemakerOptions, StabilityOptions,
    VertexOptions, WorkersAiOptions,
};
pub use policy::{CacheConfig, CacheMode, RetryConfig};
pub use target::{RouteCondition, StrategyMode, StrategySpec, Target};

use llmgate_common::camel_case_keys;
use serde_json::Value;

/// Keys exempt from camelCase conversion. They carry user-authored DSL
/// payloads (guardrail checks, conditional queries, override params) whose
/// inner spelling must survive untouched.
pub const CASING_EXCLUSIONS: &[&str] = &[
    "override_params",
    "params",
    "checks",
    "vertex_service_account_json",
    "vertexServiceAccountJson",
    "conditions",
    "input_guardrails",
    "output_guardrails",
    "default_input_guardrails",
    "default_output_guardrails",
    "integrationModelDetails",
    "cb_config",
];

/// camelCase conversion with the gateway's pinned exclusion list.
pub fn normalize_config_keys(value: Value) -> Value {
    camel_case_keys(value, CASING_EXCLUSIONS)
}
