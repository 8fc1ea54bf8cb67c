//! Typed views over a target's provider-specific fields.
//!
//! Every struct deserializes from the target's flattened extras map; all
//! fields are optional so a partial configuration still materializes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AzureOpenAiOptions {
    pub resource_name: Option<String>,
    pub deployment_id: Option<String>,
    pub api_version: Option<String>,
    pub azure_ad_token: Option<String>,
    pub azure_auth_mode: Option<String>,
    pub azure_managed_client_id: Option<String>,
    pub azure_entra_client_id: Option<String>,
    pub azure_entra_client_secret: Option<String>,
    pub azure_entra_tenant_id: Option<String>,
    pub azure_model_name: Option<String>,
    pub openai_beta: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AwsOptions {
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    pub aws_region: Option<String>,
    pub aws_role_arn: Option<String>,
    pub aws_auth_type: Option<String>,
    pub aws_external_id: Option<String>,
    pub aws_s3_bucket: Option<String>,
    pub aws_s3_object_key: Option<String>,
    pub aws_bedrock_model: Option<String>,
    pub aws_server_side_encryption: Option<String>,
    #[serde(rename = "awsServerSideEncryptionKMSKeyId")]
    pub aws_server_side_encryption_kms_key_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SagemakerOptions {
    pub amzn_sagemaker_custom_attributes: Option<String>,
    pub amzn_sagemaker_target_model: Option<String>,
    pub amzn_sagemaker_target_variant: Option<String>,
    pub amzn_sagemaker_target_container_hostname: Option<String>,
    pub amzn_sagemaker_inference_id: Option<String>,
    pub amzn_sagemaker_enable_explanations: Option<String>,
    pub amzn_sagemaker_inference_component: Option<String>,
    pub amzn_sagemaker_session_id: Option<String>,
    pub amzn_sagemaker_model_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VertexOptions {
    pub vertex_project_id: Option<String>,
    pub vertex_region: Option<String>,
    pub vertex_storage_bucket_name: Option<String>,
    pub filename: Option<String>,
    pub vertex_model_name: Option<String>,
    pub vertex_batch_endpoint: Option<String>,
    /// Parsed JSON; null when the header carried unparseable content.
    #[serde(
        rename = "vertexServiceAccountJson",
        alias = "vertex_service_account_json"
    )]
    pub vertex_service_account_json: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AzureInferenceOptions {
    pub azure_api_version: Option<String>,
    pub azure_endpoint_name: Option<String>,
    pub azure_foundry_url: Option<String>,
    pub azure_extra_params: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenAiOptions {
    pub openai_organization: Option<String>,
    pub openai_project: Option<String>,
    pub openai_beta: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnthropicOptions {
    pub anthropic_beta: Option<String>,
    pub anthropic_version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HuggingfaceOptions {
    pub huggingface_base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StabilityOptions {
    pub stability_client_id: Option<String>,
    pub stability_client_user_id: Option<String>,
    pub stability_client_version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FireworksOptions {
    pub fireworks_account_id: Option<String>,
    pub fireworks_file_length: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkersAiOptions {
    pub workers_ai_account_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CortexOptions {
    pub snowflake_account: Option<String>,
}
