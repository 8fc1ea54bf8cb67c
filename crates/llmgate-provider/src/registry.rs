use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::ProviderAdapter;
use crate::anthropic::AnthropicAdapter;
use crate::azure::AzureOpenAiAdapter;
use crate::openai::OpenAiAdapter;

#[derive(Default)]
pub struct ProviderRegistry {
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the bundled adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(OpenAiAdapter));
        registry.register(Arc::new(AnthropicAdapter));
        registry.register(Arc::new(AzureOpenAiAdapter));
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.name().to_string(), adapter);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(name).cloned()
    }
}
