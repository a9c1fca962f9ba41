use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of intents the bot is allowed to report.
/// Anything the model invents outside this set collapses to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    BranchesHours,
    BranchesList,
    AppointmentsHelp,
    AppointmentsSlots,
    FxRate,
    DocsRequired,
    Faq,
    #[default]
    Unknown,
}

impl Intent {
    /// Total coercion from a free-form label. Never fails; unrecognized
    /// labels become `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "greeting" => Intent::Greeting,
            "branches_hours" => Intent::BranchesHours,
            "branches_list" => Intent::BranchesList,
            "appointments_help" => Intent::AppointmentsHelp,
            "appointments_slots" => Intent::AppointmentsSlots,
            "fx_rate" => Intent::FxRate,
            "docs_required" => Intent::DocsRequired,
            "faq" => Intent::Faq,
            _ => Intent::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::BranchesHours => "branches_hours",
            Intent::BranchesList => "branches_list",
            Intent::AppointmentsHelp => "appointments_help",
            Intent::AppointmentsSlots => "appointments_slots",
            Intent::FxRate => "fx_rate",
            Intent::DocsRequired => "docs_required",
            Intent::Faq => "faq",
            Intent::Unknown => "unknown",
        }
    }
}

/// Reply to be sent when the model produced an empty `reply` field.
pub const EMPTY_REPLY_FALLBACK: &str =
    "Ne mogu pouzdano da odgovorim na to. Molim vas kontaktirajte banku.";

/// Reply to be sent when the model returned no text at all.
pub const NO_RESPONSE_REPLY: &str = "Nisam dobio odgovor od modela.";

/// Reply to be sent when every recovery step failed on empty input.
pub const GENERATE_FAILED_REPLY: &str = "Nisam uspeo da generišem validan odgovor.";

/// The structured answer surfaced to every caller.
/// Invariants: `intent` is a member of the closed set, `reply` is never
/// empty, `link` is "" when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotReply {
    pub intent: Intent,
    pub reply: String,
    pub link: String,
}

impl BotReply {
    /// Canned result for an empty model response.
    pub fn no_response() -> Self {
        Self {
            intent: Intent::Unknown,
            reply: NO_RESPONSE_REPLY.to_string(),
            link: String::new(),
        }
    }
}

/// Coerce a JSON value to trimmed text. Non-string scalars are rendered
/// with their JSON representation, null and missing become "".
fn coerce_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

/// Normalize arbitrary parsed model output into the canonical reply.
///
/// This is the trust boundary between the model and our output contract:
/// total (never fails, whatever the shape) and idempotent (normalizing a
/// serialized `BotReply` yields the same reply).
pub fn normalize(data: &Value) -> BotReply {
    let intent = Intent::from_label(&coerce_text(data.get("intent")));
    let mut reply = coerce_text(data.get("reply"));
    let link = coerce_text(data.get("link"));

    if reply.is_empty() {
        reply = EMPTY_REPLY_FALLBACK.to_string();
    }

    BotReply { intent, reply, link }
}
