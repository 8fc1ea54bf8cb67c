//! Derives a routing target from request headers: either one JSON config
//! header or a family of per-provider headers.

use http::HeaderMap;
use serde_json::{Map, Value};

use llmgate_common::{GatewayError, to_kebab_case};

use crate::normalize_config_keys;
use crate::target::Target;

pub const HEADER_PREFIX: &str = "x-portkey-";
pub const HEADER_CONFIG: &str = "x-portkey-config";
pub const HEADER_PROVIDER: &str = "x-portkey-provider";
pub const HEADER_DEFAULT_INPUT_GUARDRAILS: &str = "x-portkey-default-input-guardrails";
pub const HEADER_DEFAULT_OUTPUT_GUARDRAILS: &str = "x-portkey-default-output-guardrails";
pub const HEADER_METADATA: &str = "x-portkey-metadata";
pub const HEADER_FILE_PURPOSE: &str = "x-portkey-file-purpose";

const AZURE_OPENAI_FIELDS: &[&str] = &[
    "resourceName",
    "deploymentId",
    "apiVersion",
    "azureAdToken",
    "azureAuthMode",
    "azureManagedClientId",
    "azureEntraClientId",
    "azureEntraClientSecret",
    "azureEntraTenantId",
    "azureModelName",
    "openaiBeta",
];

const AWS_FIELDS: &[&str] = &[
    "awsAccessKeyId",
    "awsSecretAccessKey",
    "awsSessionToken",
    "awsRegion",
    "awsRoleArn",
    "awsAuthType",
    "awsExternalId",
    "awsS3Bucket",
    "awsS3ObjectKey",
    "awsBedrockModel",
    "awsServerSideEncryption",
    "awsServerSideEncryptionKMSKeyId",
];

const VERTEX_FIELDS: &[&str] = &[
    "vertexProjectId",
    "vertexRegion",
    "vertexStorageBucketName",
    "filename",
    "vertexModelName",
    "vertexBatchEndpoint",
];

const AZURE_INFERENCE_FIELDS: &[&str] = &[
    "azureApiVersion",
    "azureEndpointName",
    "azureFoundryUrl",
    "azureExtraParams",
];

const OPENAI_FIELDS: &[&str] = &["openaiOrganization", "openaiProject", "openaiBeta"];
const ANTHROPIC_FIELDS: &[&str] = &["anthropicBeta", "anthropicVersion"];
const HUGGINGFACE_FIELDS: &[&str] = &["huggingfaceBaseUrl"];
const STABILITY_FIELDS: &[&str] = &[
    "stabilityClientId",
    "stabilityClientUserId",
    "stabilityClientVersion",
];
const FIREWORKS_FIELDS: &[&str] = &["fireworksAccountId", "fireworksFileLength"];
const WORKERS_AI_FIELDS: &[&str] = &["workersAiAccountId"];
const CORTEX_FIELDS: &[&str] = &["snowflakeAccount"];

const VERTEX_SERVICE_ACCOUNT_HEADER: &str = "x-portkey-vertex-service-account-json";
const MISTRAL_FIM_HEADER: &str = "x-portkey-mistral-fim-completion";

/// Build the routing target from request headers.
///
/// `x-portkey-config` wins when present; otherwise a flat provider target is
/// assembled from the individual `x-portkey-*` headers. Key casing is
/// normalized last so user-authored DSL keys survive (see
/// [`crate::CASING_EXCLUSIONS`]).
pub fn build_target_from_headers(headers: &HeaderMap) -> Result<Target, GatewayError> {
    let default_input = parse_guardrail_list(header_str(headers, HEADER_DEFAULT_INPUT_GUARDRAILS));
    let default_output = parse_guardrail_list(header_str(headers, HEADER_DEFAULT_OUTPUT_GUARDRAILS));

    let mut map = match header_str(headers, HEADER_CONFIG) {
        Some(raw) => {
            let parsed: Value = serde_json::from_str(raw).map_err(|err| {
                GatewayError::gateway(format!("invalid {HEADER_CONFIG} header: {err}"))
            })?;
            let Value::Object(mut map) = parsed else {
                return Err(GatewayError::gateway(format!(
                    "{HEADER_CONFIG} header must carry a JSON object"
                )));
            };
            if !map.contains_key("provider") && !map.contains_key("targets") {
                enrich_flat_options(&mut map, headers);
            }
            map
        }
        None => {
            let mut map = Map::new();
            enrich_flat_options(&mut map, headers);
            map
        }
    };

    if !default_input.is_empty() {
        map.insert(
            "default_input_guardrails".to_string(),
            Value::Array(default_input),
        );
    }
    if !default_output.is_empty() {
        map.insert(
            "default_output_guardrails".to_string(),
            Value::Array(default_output),
        );
    }

    let normalized = normalize_config_keys(Value::Object(map));
    Target::from_value(normalized)
        .map_err(|err| GatewayError::gateway(format!("invalid gateway config: {err}")))
}

/// Strip the conventional `Bearer ` prefix off an authorization value.
pub fn strip_bearer(value: &str) -> &str {
    value.strip_prefix("Bearer ").unwrap_or(value).trim()
}

fn enrich_flat_options(map: &mut Map<String, Value>, headers: &HeaderMap) {
    let provider = header_str(headers, HEADER_PROVIDER).unwrap_or_default().to_string();
    if !provider.is_empty() {
        map.insert("provider".to_string(), Value::String(provider.clone()));
    }
    if let Some(auth) = header_str(headers, "authorization") {
        let api_key = strip_bearer(auth);
        if !api_key.is_empty() {
            map.insert("apiKey".to_string(), Value::String(api_key.to_string()));
        }
    }
    for (field, value) in provider_enrichment(headers, &provider) {
        map.insert(field, value);
    }
}

fn provider_enrichment(headers: &HeaderMap, provider: &str) -> Map<String, Value> {
    let mut out = Map::new();
    let Some(fields) = provider_fields(provider) else {
        // Unknown provider: only the mistral FIM completion toggle applies.
        if let Some(value) = header_str(headers, MISTRAL_FIM_HEADER) {
            out.insert(
                "mistralFimCompletion".to_string(),
                Value::String(value.to_string()),
            );
        }
        return out;
    };

    for field in fields {
        let header = format!("{HEADER_PREFIX}{}", to_kebab_case(field));
        if let Some(value) = header_str(headers, &header) {
            out.insert((*field).to_string(), Value::String(value.to_string()));
        }
    }
    if provider == "google-vertex-ai"
        && let Some(raw) = header_str(headers, VERTEX_SERVICE_ACCOUNT_HEADER)
    {
        // Unparseable service-account JSON degrades to null, not an error.
        out.insert(
            "vertexServiceAccountJson".to_string(),
            serde_json::from_str(raw).unwrap_or(Value::Null),
        );
    }
    out
}

fn provider_fields(provider: &str) -> Option<&'static [&'static str]> {
    match provider {
        "azure-openai" => Some(AZURE_OPENAI_FIELDS),
        "bedrock" => Some(AWS_FIELDS),
        "sagemaker" => Some(SAGEMAKER_AND_AWS_FIELDS),
        "workers-ai" => Some(WORKERS_AI_FIELDS),
        "google-vertex-ai" => Some(VERTEX_FIELDS),
        "azure-ai-inference" => Some(AZURE_INFERENCE_FIELDS),
        "openai" => Some(OPENAI_FIELDS),
        "anthropic" => Some(ANTHROPIC_FIELDS),
        "huggingface" => Some(HUGGINGFACE_FIELDS),
        "stability-ai" => Some(STABILITY_FIELDS),
        "fireworks-ai" => Some(FIREWORKS_FIELDS),
        "cortex" => Some(CORTEX_FIELDS),
        _ => None,
    }
}

const SAGEMAKER_AND_AWS_FIELDS: &[&str] = &[
    "awsAccessKeyId",
    "awsSecretAccessKey",
    "awsSessionToken",
    "awsRegion",
    "awsRoleArn",
    "awsAuthType",
    "awsExternalId",
    "awsS3Bucket",
    "awsS3ObjectKey",
    "awsBedrockModel",
    "awsServerSideEncryption",
    "awsServerSideEncryptionKMSKeyId",
    "amznSagemakerCustomAttributes",
    "amznSagemakerTargetModel",
    "amznSagemakerTargetVariant",
    "amznSagemakerTargetContainerHostname",
    "amznSagemakerInferenceId",
    "amznSagemakerEnableExplanations",
    "amznSagemakerInferenceComponent",
    "amznSagemakerSessionId",
    "amznSagemakerModelName",
];

fn parse_guardrail_list(raw: Option<&str>) -> Vec<Value> {
    raw.and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .and_then(|value| value.as_array().cloned())
        .unwrap_or_default()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                http::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn flat_headers_build_a_leaf_target() {
        let headers = headers(&[
            ("x-portkey-provider", "openai"),
            ("authorization", "Bearer sk-test"),
            ("x-portkey-openai-organization", "org-1"),
        ]);
        let target = build_target_from_headers(&headers).unwrap();
        assert_eq!(target.provider.as_deref(), Some("openai"));
        assert_eq!(target.api_key.as_deref(), Some("sk-test"));
        assert_eq!(target.extra_str("openaiOrganization"), Some("org-1"));
    }

    #[test]
    fn config_header_wins_and_keys_are_camel_cased() {
        let config = json!({
            "provider": "anthropic",
            "api_key": "sk-a",
            "request_timeout": 4000,
            "override_params": {"max_tokens": 64}
        });
        let headers = headers(&[("x-portkey-config", &config.to_string())]);
        let target = build_target_from_headers(&headers).unwrap();
        assert_eq!(target.provider.as_deref(), Some("anthropic"));
        assert_eq!(target.api_key.as_deref(), Some("sk-a"));
        assert_eq!(target.request_timeout, Some(4000));
        // exclusion-listed keys keep their inner casing
        assert_eq!(
            target.override_params.unwrap().get("max_tokens"),
            Some(&json!(64))
        );
    }

    #[test]
    fn config_without_provider_or_targets_is_enriched_from_headers() {
        let config = json!({"retry": {"attempts": 1}});
        let headers = headers(&[
            ("x-portkey-config", &config.to_string()),
            ("x-portkey-provider", "azure-openai"),
            ("authorization", "Bearer key"),
            ("x-portkey-resource-name", "res"),
            ("x-portkey-deployment-id", "dep"),
        ]);
        let target = build_target_from_headers(&headers).unwrap();
        assert_eq!(target.provider.as_deref(), Some("azure-openai"));
        assert_eq!(target.api_key.as_deref(), Some("key"));
        assert_eq!(target.extra_str("resourceName"), Some("res"));
        assert_eq!(target.extra_str("deploymentId"), Some("dep"));
        assert_eq!(target.retry.unwrap().attempts, 1);
    }

    #[test]
    fn nested_config_is_not_enriched() {
        let config = json!({
            "strategy": {"mode": "fallback"},
            "targets": [{"provider": "openai", "api_key": "a"}]
        });
        let headers = headers(&[
            ("x-portkey-config", &config.to_string()),
            ("x-portkey-provider", "anthropic"),
        ]);
        let target = build_target_from_headers(&headers).unwrap();
        assert!(target.provider.is_none());
        assert_eq!(target.targets.unwrap().len(), 1);
    }

    #[test]
    fn vertex_service_account_json_nulls_on_parse_failure() {
        let headers = headers(&[
            ("x-portkey-provider", "google-vertex-ai"),
            ("x-portkey-vertex-service-account-json", "{not json"),
        ]);
        let target = build_target_from_headers(&headers).unwrap();
        assert_eq!(
            target.extras.get("vertexServiceAccountJson"),
            Some(&Value::Null)
        );
    }

    #[test]
    fn unknown_provider_only_picks_up_mistral_fim() {
        let headers = headers(&[
            ("x-portkey-provider", "mistral-ai"),
            ("x-portkey-mistral-fim-completion", "true"),
            ("x-portkey-resource-name", "ignored"),
        ]);
        let target = build_target_from_headers(&headers).unwrap();
        assert_eq!(target.extra_str("mistralFimCompletion"), Some("true"));
        assert!(target.extras.get("resourceName").is_none());
    }

    #[test]
    fn default_guardrail_headers_attach_to_the_root() {
        let guardrails = json!([{"regexMatch": {"rule": ".*"}}]);
        let headers = headers(&[
            ("x-portkey-provider", "openai"),
            ("x-portkey-default-input-guardrails", &guardrails.to_string()),
        ]);
        let target = build_target_from_headers(&headers).unwrap();
        assert_eq!(target.default_input_guardrails.unwrap().len(), 1);
    }

    #[test]
    fn builder_output_round_trips_through_the_config_header() {
        let config = json!({
            "strategy": {"mode": "loadbalance"},
            "targets": [
                {"provider": "openai", "api_key": "a", "weight": 2,
                 "override_params": {"top_p": 0.5}},
                {"provider": "anthropic", "api_key": "b", "weight": 1,
                 "input_guardrails": [{"wordCount": {"min_words": 1}}]}
            ]
        });
        let headers = headers(&[("x-portkey-config", &config.to_string())]);
        let first = build_target_from_headers(&headers).unwrap();

        let serialized = serde_json::to_string(&first).unwrap();
        let headers = headers_from(&serialized);
        let second = build_target_from_headers(&headers).unwrap();
        assert_eq!(first, second);
    }

    fn headers_from(config: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(HEADER_CONFIG, HeaderValue::from_str(config).unwrap());
        map
    }
}
