use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use super::messages::ChatMessage;

/// Sampling parameters for one completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider for constrained JSON output when supported.
    pub json_mode: bool,
}

/// Interface for a chat completion backend.
/// Kept minimal so the recovery ladder can be exercised against a scripted
/// implementation in tests.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send the message sequence and return the raw text of the first choice.
    async fn complete(&self, messages: &[ChatMessage], opts: &CompletionOptions) -> Result<String>;
}

/// Client for a Groq (OpenAI-compatible) chat completions endpoint.
pub struct GroqClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }

    fn build_body(&self, messages: &[ChatMessage], opts: &CompletionOptions, extended: bool) -> Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": opts.temperature,
        });

        if extended {
            body["max_tokens"] = serde_json::json!(opts.max_tokens);
            if opts.json_mode {
                body["response_format"] = serde_json::json!({"type": "json_object"});
            }
        }

        body
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .context("chat completion request failed")
    }
}

/// Whether an error response indicates the endpoint rejected one of the
/// extended parameters (rather than the request itself being bad).
fn is_unsupported_parameter_error(status: StatusCode, body: &str) -> bool {
    if !status.is_client_error() {
        return false;
    }
    let body = body.to_lowercase();
    body.contains("response_format")
        || body.contains("max_tokens")
        || body.contains("unsupported")
        || body.contains("not supported")
}

/// Pull the generated text out of a chat completions response.
/// A missing or null content field is treated as an empty response, which
/// the recovery ladder handles downstream.
fn first_choice_content(response: &Value) -> String {
    response["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl ChatCompletion for GroqClient {
    async fn complete(&self, messages: &[ChatMessage], opts: &CompletionOptions) -> Result<String> {
        // Full-feature request first; fall back once, deterministically, if
        // the endpoint rejects an extended parameter.
        let response = self.send(&self.build_body(messages, opts, true)).await?;

        let response = if response.status().is_success() {
            response
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if !is_unsupported_parameter_error(status, &body) {
                bail!("chat completion failed with {}: {}", status, body);
            }

            warn!(
                "endpoint rejected extended parameters ({}), retrying with minimal request",
                status
            );
            let retry = self.send(&self.build_body(messages, opts, false)).await?;
            if !retry.status().is_success() {
                let status = retry.status();
                let body = retry.text().await.unwrap_or_default();
                bail!("chat completion failed with {}: {}", status, body);
            }
            retry
        };

        let payload: Value = response
            .json()
            .await
            .context("chat completion response was not valid JSON")?;
        let content = first_choice_content(&payload);
        debug!("completion returned {} chars", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GroqClient {
        GroqClient::new(
            "https://api.groq.com/openai/v1".to_string(),
            "gsk-test".to_string(),
            "llama3-8b-8192".to_string(),
        )
    }

    #[test]
    fn extended_body_carries_all_parameters() {
        let opts = CompletionOptions {
            temperature: 0.2,
            max_tokens: 320,
            json_mode: true,
        };
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let body = client().build_body(&messages, &opts, true);

        assert_eq!(body["model"], "llama3-8b-8192");
        assert_eq!(body["max_tokens"], 320);
        assert_eq!(body["response_format"]["type"], "json_object");
        let temp = body["temperature"].as_f64().unwrap();
        assert!((temp - 0.2).abs() < 0.001);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "hi");
    }

    #[test]
    fn minimal_body_drops_extended_parameters() {
        let opts = CompletionOptions {
            temperature: 0.0,
            max_tokens: 250,
            json_mode: true,
        };
        let body = client().build_body(&[ChatMessage::user("hi")], &opts, false);
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("response_format").is_none());
        assert_eq!(body["temperature"].as_f64().unwrap(), 0.0);
    }

    #[test]
    fn unsupported_parameter_detection() {
        let bad_param = r#"{"error":{"message":"'response_format' is not supported for this model"}}"#;
        assert!(is_unsupported_parameter_error(StatusCode::BAD_REQUEST, bad_param));
        assert!(is_unsupported_parameter_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "max_tokens is invalid here"
        ));

        // Genuine bad requests and server failures must propagate.
        assert!(!is_unsupported_parameter_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"messages must not be empty"}}"#
        ));
        assert!(!is_unsupported_parameter_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "response_format exploded"
        ));
        assert!(!is_unsupported_parameter_error(StatusCode::UNAUTHORIZED, ""));
    }

    #[test]
    fn first_choice_content_defaults_to_empty() {
        let ok = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "zdravo"}}]
        });
        assert_eq!(first_choice_content(&ok), "zdravo");

        let missing = serde_json::json!({"choices": []});
        assert_eq!(first_choice_content(&missing), "");
        assert_eq!(first_choice_content(&serde_json::json!({})), "");
    }
}
