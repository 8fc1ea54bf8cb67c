use llmgate_common::{GatewayError, Headers, header_set};
use llmgate_config::{AzureOpenAiOptions, Target};

use crate::adapter::ProviderAdapter;
use crate::openai::openai_compatible_path;

const DEFAULT_API_VERSION: &str = "2024-02-01";

pub struct AzureOpenAiAdapter;

impl AzureOpenAiAdapter {
    fn options(target: &Target) -> AzureOpenAiOptions {
        target.typed_options()
    }
}

impl ProviderAdapter for AzureOpenAiAdapter {
    fn name(&self) -> &'static str {
        "azure-openai"
    }

    fn base_url(&self, target: &Target) -> Result<String, GatewayError> {
        let options = Self::options(target);
        let resource = options
            .resource_name
            .ok_or_else(|| GatewayError::gateway("azure-openai: resourceName is missing"))?;
        let deployment = options
            .deployment_id
            .ok_or_else(|| GatewayError::gateway("azure-openai: deploymentId is missing"))?;
        Ok(format!(
            "https://{resource}.openai.azure.com/openai/deployments/{deployment}"
        ))
    }

    fn endpoint_path(&self, endpoint: &str, target: &Target) -> Result<String, GatewayError> {
        let options = Self::options(target);
        let api_version = options
            .api_version
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        let path = openai_compatible_path(endpoint)?;
        Ok(format!("{path}?api-version={api_version}"))
    }

    fn request_headers(&self, target: &Target, _endpoint: &str) -> Result<Headers, GatewayError> {
        let options = Self::options(target);
        let mut headers = Headers::new();
        if let Some(token) = options.azure_ad_token {
            let token = token.strip_prefix("Bearer ").unwrap_or(&token);
            header_set(&mut headers, "authorization", format!("Bearer {token}"));
        } else if let Some(api_key) = target.api_key.as_deref() {
            header_set(&mut headers, "api-key", api_key);
        } else {
            return Err(GatewayError::gateway(
                "azure-openai: neither api key nor AD token configured",
            ));
        }
        if let Some(beta) = options.openai_beta {
            header_set(&mut headers, "openai-beta", beta);
        }
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::resolve_request_url;
    use serde_json::json;

    fn azure_target() -> Target {
        let mut target = Target {
            api_key: Some("azkey".to_string()),
            ..Target::default()
        };
        target.extras.insert("resourceName".to_string(), json!("acct"));
        target.extras.insert("deploymentId".to_string(), json!("gpt4"));
        target
            .extras
            .insert("apiVersion".to_string(), json!("2024-06-01"));
        target
    }

    #[test]
    fn url_carries_resource_deployment_and_api_version() {
        let url = resolve_request_url(&AzureOpenAiAdapter, &azure_target(), "chatComplete").unwrap();
        assert_eq!(
            url,
            "https://acct.openai.azure.com/openai/deployments/gpt4/chat/completions?api-version=2024-06-01"
        );
    }

    #[test]
    fn missing_resource_name_is_a_gateway_error() {
        let target = Target::default();
        assert!(AzureOpenAiAdapter.base_url(&target).is_err());
    }
}
