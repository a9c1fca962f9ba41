use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 320;

/// Read-only configuration for the LLM adapter, resolved once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    /// Build the configuration from the environment. A missing API key is a
    /// fatal error; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .context("Missing GROQ_API_KEY env var")?;

        let base_url =
            std::env::var("GROQ_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let temperature = match std::env::var("GROQ_TEMPERATURE") {
            Ok(raw) => raw
                .parse::<f32>()
                .with_context(|| format!("Invalid GROQ_TEMPERATURE: {}", raw))?,
            Err(_) => DEFAULT_TEMPERATURE,
        };

        let max_tokens = match std::env::var("GROQ_MAX_TOKENS") {
            Ok(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("Invalid GROQ_MAX_TOKENS: {}", raw))?,
            Err(_) => DEFAULT_MAX_TOKENS,
        };

        Ok(Self {
            api_key,
            base_url,
            model,
            temperature,
            max_tokens,
        })
    }
}
