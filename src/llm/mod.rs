pub mod client;
pub mod extract;
pub mod messages;
pub mod schema;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use client::{ChatCompletion, CompletionOptions};
use messages::{assemble_messages, ChatMessage, ChatTurn, REPAIR_PROMPT, SYSTEM_PROMPT};
use schema::{normalize, BotReply, Intent, GENERATE_FAILED_REPLY};

/// How many history turns are forwarded to the model when the caller does
/// not say otherwise.
pub const DEFAULT_HISTORY_TURNS: usize = 10;

/// Token budget for the repair round-trip, smaller than the primary call.
const REPAIR_MAX_TOKENS: u32 = 250;

/// Upper bound on how much raw model text the final fallback echoes back.
const FALLBACK_REPLY_CHARS: usize = 600;

/// Inbound contract: the user question plus optional trusted context,
/// history and state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatJsonRequest {
    pub message: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default)]
    pub state: Option<Value>,
    #[serde(default)]
    pub max_history_turns: Option<usize>,
}

/// Ask the model the user's question and coerce whatever comes back into a
/// valid `BotReply`.
///
/// Transport and configuration failures on the primary call propagate to
/// the caller. Malformed model output never does: the recovery ladder
/// (direct parse, balanced-brace extraction, one repair round-trip, canned
/// fallback) always resolves to a schema-valid reply.
pub async fn chat_json(
    llm: &dyn ChatCompletion,
    config: &LlmConfig,
    request: &ChatJsonRequest,
) -> Result<BotReply> {
    let messages = assemble_messages(
        &request.message,
        &request.context,
        &request.history,
        request.state.as_ref(),
        request.max_history_turns.unwrap_or(DEFAULT_HISTORY_TURNS),
    );

    let opts = CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        json_mode: true,
    };
    let raw = llm.complete(&messages, &opts).await?;
    let content = raw.trim().to_string();

    if content.is_empty() {
        debug!("model returned empty content");
        return Ok(BotReply::no_response());
    }

    if let Some(reply) = parse_reply(&content) {
        return Ok(reply);
    }

    // Failures inside the repair pass must never fail the request.
    match repair(llm, &content).await {
        Ok(Some(reply)) => return Ok(reply),
        Ok(None) => info!("repair pass still produced invalid JSON"),
        Err(e) => warn!("repair pass call failed: {:#}", e),
    }

    Ok(fallback_reply(&content))
}

/// Direct parse, then balanced-brace extraction. Only JSON objects count;
/// scalars and arrays fall through to the next recovery step.
fn parse_reply(text: &str) -> Option<BotReply> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if value.is_object() {
            return Some(normalize(&value));
        }
    }

    let blob = extract::first_json_object(text)?;
    let value = serde_json::from_str::<Value>(blob).ok()?;
    value.is_object().then(|| normalize(&value))
}

/// One extra round-trip asking the model to rewrite its own malformed
/// output as schema-valid JSON, at temperature 0.
async fn repair(llm: &dyn ChatCompletion, malformed: &str) -> Result<Option<BotReply>> {
    let messages = vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("{}\n\n{}", REPAIR_PROMPT, malformed)),
    ];
    let opts = CompletionOptions {
        temperature: 0.0,
        max_tokens: REPAIR_MAX_TOKENS,
        json_mode: true,
    };

    let repaired = llm.complete(&messages, &opts).await?;
    Ok(parse_reply(repaired.trim()))
}

/// Last rung of the ladder: echo a bounded prefix of the raw model text so
/// the user still sees something, under the unknown intent.
fn fallback_reply(content: &str) -> BotReply {
    let reply: String = content.chars().take(FALLBACK_REPLY_CHARS).collect();
    let reply = if reply.is_empty() {
        GENERATE_FAILED_REPLY.to_string()
    } else {
        reply
    };

    BotReply {
        intent: Intent::Unknown,
        reply,
        link: String::new(),
    }
}
