use std::sync::Arc;

use crate::config::LlmConfig;
use crate::llm::client::GroqClient;

#[derive(Clone)]
pub struct AppState {
    pub config: LlmConfig,
    pub llm: Arc<GroqClient>,
}

impl AppState {
    pub fn new(config: LlmConfig) -> Self {
        let llm = Arc::new(GroqClient::new(
            config.base_url.clone(),
            config.api_key.clone(),
            config.model.clone(),
        ));

        Self { config, llm }
    }
}
