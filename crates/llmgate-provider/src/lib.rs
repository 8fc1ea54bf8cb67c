//! Provider adapter contract and registry.
//!
//! Adapters translate a leaf target into concrete upstream request pieces:
//! URL, auth headers, and body transforms. The bundled adapters are thin --
//! auth and addressing only, transforms pass the OpenAI-shaped payload
//! through -- which is all the routing core and its tests require.

pub mod adapter;
pub mod anthropic;
pub mod azure;
pub mod openai;
pub mod registry;

pub use adapter::{ProviderAdapter, ProviderRequestHandler, resolve_request_url};
pub use anthropic::AnthropicAdapter;
pub use azure::AzureOpenAiAdapter;
pub use openai::OpenAiAdapter;
pub use registry::ProviderRegistry;
