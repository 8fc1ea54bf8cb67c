use serde_json::{Map, Value};

use crate::policy::{CacheConfig, RetryConfig};
use crate::target::Target;

/// Downward-flowing configuration snapshot threaded through the target walk.
///
/// Merge rules: preference to the current node; `override_params` merges
/// shallowly with current-wins; list-valued fields replace entirely when the
/// current node sets them; `retry` and `cache` replace atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InheritedConfig {
    pub id: Option<String>,
    pub override_params: Option<Map<String, Value>>,
    pub retry: Option<RetryConfig>,
    pub cache: Option<CacheConfig>,
    pub request_timeout: Option<u64>,
    /// Canonical (already expanded) hook objects applied to every leaf.
    pub default_input_guardrails: Option<Vec<Value>>,
    pub default_output_guardrails: Option<Vec<Value>>,
    pub strict_open_ai_compliance: Option<bool>,
    pub forward_headers: Option<Vec<String>>,
    pub custom_host: Option<String>,
    pub before_request_hooks: Option<Vec<Value>>,
    pub after_request_hooks: Option<Vec<Value>>,
}

impl InheritedConfig {
    pub fn is_empty(&self) -> bool {
        self == &InheritedConfig::default()
    }

    /// Fold the current node's fields over this record.
    pub fn merge_with(&self, target: &Target) -> InheritedConfig {
        let override_params = match (&self.override_params, &target.override_params) {
            (Some(base), Some(current)) => {
                let mut merged = base.clone();
                for (key, value) in current {
                    merged.insert(key.clone(), value.clone());
                }
                Some(merged)
            }
            (base, current) => current.clone().or_else(|| base.clone()),
        };

        InheritedConfig {
            id: target.id.clone().or_else(|| self.id.clone()),
            override_params,
            retry: target.retry.clone().or_else(|| self.retry.clone()),
            cache: target.cache.clone().or_else(|| self.cache.clone()),
            request_timeout: target.request_timeout.or(self.request_timeout),
            default_input_guardrails: target
                .default_input_guardrails
                .clone()
                .or_else(|| self.default_input_guardrails.clone()),
            default_output_guardrails: target
                .default_output_guardrails
                .clone()
                .or_else(|| self.default_output_guardrails.clone()),
            strict_open_ai_compliance: target
                .strict_open_ai_compliance
                .or(self.strict_open_ai_compliance),
            forward_headers: target
                .forward_headers
                .clone()
                .or_else(|| self.forward_headers.clone()),
            custom_host: target.custom_host.clone().or_else(|| self.custom_host.clone()),
            before_request_hooks: target
                .before_request_hooks
                .clone()
                .or_else(|| self.before_request_hooks.clone()),
            after_request_hooks: target
                .after_request_hooks
                .clone()
                .or_else(|| self.after_request_hooks.clone()),
        }
    }

    /// Materialize the merged record onto the node so downstream processors
    /// see inherited settings as leaf fields.
    pub fn apply_to(&self, target: &mut Target) {
        if target.override_params.is_none() {
            target.override_params = self.override_params.clone();
        }
        if target.retry.is_none() {
            target.retry = self.retry.clone();
        }
        if target.cache.is_none() {
            target.cache = self.cache.clone();
        }
        if target.request_timeout.is_none() {
            target.request_timeout = self.request_timeout;
        }
        if target.forward_headers.is_none() {
            target.forward_headers = self.forward_headers.clone();
        }
        if target.custom_host.is_none() {
            target.custom_host = self.custom_host.clone();
        }
        if target.before_request_hooks.is_none() {
            target.before_request_hooks = self.before_request_hooks.clone();
        }
        if target.after_request_hooks.is_none() {
            target.after_request_hooks = self.after_request_hooks.clone();
        }
        if target.strict_open_ai_compliance.is_none() {
            target.strict_open_ai_compliance = self.strict_open_ai_compliance;
        }
        if target.default_input_guardrails.is_none() {
            target.default_input_guardrails = self.default_input_guardrails.clone();
        }
        if target.default_output_guardrails.is_none() {
            target.default_output_guardrails = self.default_output_guardrails.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn current_node_wins_over_inherited() {
        let inherited = InheritedConfig {
            request_timeout: Some(1_000),
            custom_host: Some("https://old.example".to_string()),
            ..InheritedConfig::default()
        };
        let target = Target {
            request_timeout: Some(2_000),
            ..Target::default()
        };
        let merged = inherited.merge_with(&target);
        assert_eq!(merged.request_timeout, Some(2_000));
        assert_eq!(merged.custom_host.as_deref(), Some("https://old.example"));
    }

    #[test]
    fn override_params_merge_shallowly_current_wins() {
        let inherited = InheritedConfig {
            override_params: Some(map(&[("model", json!("gpt-4")), ("temperature", json!(0.1))])),
            ..InheritedConfig::default()
        };
        let target = Target {
            override_params: Some(map(&[("model", json!("gpt-4o"))])),
            ..Target::default()
        };
        let merged = inherited.merge_with(&target).override_params.unwrap();
        assert_eq!(merged.get("model"), Some(&json!("gpt-4o")));
        assert_eq!(merged.get("temperature"), Some(&json!(0.1)));
    }

    #[test]
    fn retry_replaces_atomically() {
        let inherited = InheritedConfig {
            retry: Some(RetryConfig {
                attempts: 5,
                on_status_codes: Some(vec![500]),
                use_retry_after_header: Some(true),
            }),
            ..InheritedConfig::default()
        };
        let target = Target {
            retry: Some(RetryConfig {
                attempts: 1,
                on_status_codes: None,
                use_retry_after_header: None,
            }),
            ..Target::default()
        };
        let merged = inherited.merge_with(&target).retry.unwrap();
        assert_eq!(merged.attempts, 1);
        assert_eq!(merged.on_status_codes, None);
    }

    #[test]
    fn lists_replace_entirely_when_current_sets_them() {
        let inherited = InheritedConfig {
            forward_headers: Some(vec!["x-a".to_string(), "x-b".to_string()]),
            ..InheritedConfig::default()
        };
        let target = Target {
            forward_headers: Some(vec!["x-c".to_string()]),
            ..Target::default()
        };
        let merged = inherited.merge_with(&target);
        assert_eq!(merged.forward_headers, Some(vec!["x-c".to_string()]));
    }
}
