use llmgate_common::{GatewayError, Headers, endpoints, header_set};
use llmgate_config::{OpenAiOptions, Target};

use crate::adapter::ProviderAdapter;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI and OpenAI-compatible hosts (the common case for `custom_host`
/// targets).
pub struct OpenAiAdapter;

impl ProviderAdapter for OpenAiAdapter {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn base_url(&self, _target: &Target) -> Result<String, GatewayError> {
        Ok(OPENAI_BASE_URL.to_string())
    }

    fn endpoint_path(&self, endpoint: &str, _target: &Target) -> Result<String, GatewayError> {
        openai_compatible_path(endpoint)
    }

    fn request_headers(&self, target: &Target, _endpoint: &str) -> Result<Headers, GatewayError> {
        let mut headers = Headers::new();
        let api_key = target
            .api_key
            .as_deref()
            .ok_or_else(|| GatewayError::gateway("openai: api key is missing"))?;
        header_set(&mut headers, "authorization", format!("Bearer {api_key}"));

        let options: OpenAiOptions = target.typed_options();
        if let Some(organization) = options.openai_organization {
            header_set(&mut headers, "openai-organization", organization);
        }
        if let Some(project) = options.openai_project {
            header_set(&mut headers, "openai-project", project);
        }
        if let Some(beta) = options.openai_beta {
            header_set(&mut headers, "openai-beta", beta);
        }
        Ok(headers)
    }
}

pub(crate) fn openai_compatible_path(endpoint: &str) -> Result<String, GatewayError> {
    match endpoint {
        endpoints::CHAT_COMPLETE => Ok("/chat/completions".to_string()),
        endpoints::COMPLETE => Ok("/completions".to_string()),
        endpoints::EMBED => Ok("/embeddings".to_string()),
        endpoints::UPLOAD_FILE => Ok("/files".to_string()),
        other => Err(GatewayError::gateway(format!(
            "endpoint {other} is not supported for this provider"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::resolve_request_url;
    use llmgate_common::header_get;

    #[test]
    fn builds_bearer_auth_and_org_headers() {
        let mut target = Target {
            api_key: Some("sk-1".to_string()),
            ..Target::default()
        };
        target.extras.insert(
            "openaiOrganization".to_string(),
            serde_json::json!("org-7"),
        );
        let headers = OpenAiAdapter.request_headers(&target, "chatComplete").unwrap();
        assert_eq!(header_get(&headers, "authorization"), Some("Bearer sk-1"));
        assert_eq!(header_get(&headers, "openai-organization"), Some("org-7"));
    }

    #[test]
    fn custom_host_overrides_the_base_url() {
        let target = Target {
            api_key: Some("k".to_string()),
            custom_host: Some("https://llm.internal/v1/".to_string()),
            ..Target::default()
        };
        let url = resolve_request_url(&OpenAiAdapter, &target, "chatComplete").unwrap();
        assert_eq!(url, "https://llm.internal/v1/chat/completions");
    }

    #[test]
    fn proxy_endpoint_keeps_the_bare_base() {
        let target = Target {
            api_key: Some("k".to_string()),
            ..Target::default()
        };
        let url = resolve_request_url(&OpenAiAdapter, &target, "proxy").unwrap();
        assert_eq!(url, OPENAI_BASE_URL);
    }
}
