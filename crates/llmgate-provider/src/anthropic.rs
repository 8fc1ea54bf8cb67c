use llmgate_common::{GatewayError, Headers, endpoints, header_set};
use llmgate_config::{AnthropicOptions, Target};

use crate::adapter::ProviderAdapter;

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter;

impl ProviderAdapter for AnthropicAdapter {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn base_url(&self, _target: &Target) -> Result<String, GatewayError> {
        Ok(ANTHROPIC_BASE_URL.to_string())
    }

    fn endpoint_path(&self, endpoint: &str, _target: &Target) -> Result<String, GatewayError> {
        match endpoint {
            endpoints::CHAT_COMPLETE => Ok("/messages".to_string()),
            endpoints::COMPLETE => Ok("/complete".to_string()),
            other => Err(GatewayError::gateway(format!(
                "endpoint {other} is not supported for anthropic"
            ))),
        }
    }

    fn request_headers(&self, target: &Target, _endpoint: &str) -> Result<Headers, GatewayError> {
        let mut headers = Headers::new();
        let api_key = target
            .api_key
            .as_deref()
            .ok_or_else(|| GatewayError::gateway("anthropic: api key is missing"))?;
        header_set(&mut headers, "x-api-key", api_key);

        let options: AnthropicOptions = target.typed_options();
        header_set(
            &mut headers,
            "anthropic-version",
            options
                .anthropic_version
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_VERSION.to_string()),
        );
        if let Some(beta) = options.anthropic_beta {
            header_set(&mut headers, "anthropic-beta", beta);
        }
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmgate_common::header_get;

    #[test]
    fn version_header_defaults_and_beta_is_optional() {
        let target = Target {
            api_key: Some("sk-ant".to_string()),
            ..Target::default()
        };
        let headers = AnthropicAdapter.request_headers(&target, "chatComplete").unwrap();
        assert_eq!(header_get(&headers, "x-api-key"), Some("sk-ant"));
        assert_eq!(
            header_get(&headers, "anthropic-version"),
            Some(DEFAULT_ANTHROPIC_VERSION)
        );
        assert_eq!(header_get(&headers, "anthropic-beta"), None);
    }
}
