use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One prior turn of the conversation, supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// A message in the outbound completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// System prompt for the banking assistant. The model is instructed to
/// answer with JSON only, matching the `BotReply` schema.
pub const SYSTEM_PROMPT: &str = r#"Ti si bankarski chatbot za Srbiju. Pomažeš korisnicima oko:
- filijala i radnog vremena
- rezervacije termina (koraci, potrebni podaci, slobodni slotovi)
- osnovne informacije o dokumentima
- FAQ o bankarskim uslugama (na visokom nivou)

OBAVEZNO: Odgovori ISKLJUČIVO validnim JSON-om (bez dodatnog teksta, bez markdown-a).

Schema:
{
  "intent": "greeting|branches_hours|branches_list|appointments_help|appointments_slots|fx_rate|docs_required|faq|unknown",
  "reply": "kratak i koristan odgovor na srpskom",
  "link": "opciono, ili prazno"
}

Pravila:
- reply max ~2-4 rečenice, jasno i profesionalno
- Ako korisnik pita nejasno (npr. 'a kako to', 'šta još'), postavi 1-2 potpitanja ili ponudi 3 konkretne opcije.
- Ne izmišljaj tarife/kurseve/tačne podatke ako nisu u KONTEKSTU/STATE; ako nema info → intent=unknown i uputi na zvaničan kontakt.
- link neka bude "" ako nema
- JSON mora da se parsira bez greške
- Ne ponavljaj istu generičku rečenicu (tipa 'Mogu da pomognem...') više puta.

Primeri (format je OBAVEZNO JSON):
{"intent":"greeting","reply":"Zdravo! Mogu pomoći oko filijala, termina i potrebne dokumentacije. Šta vam treba?","link":""}
{"intent":"appointments_help","reply":"Da biste rezervisali termin, recite: filijalu, datum i uslugu. Da li već imate izabranu filijalu?","link":""}
{"intent":"unknown","reply":"Ne mogu pouzdano da odgovorim bez dodatnih informacija. Možete li precizirati pitanje ili kontaktirati banku?","link":""}"#;

/// Instruction for the repair round-trip: same schema, JSON only.
pub const REPAIR_PROMPT: &str = r#"Popravi sledeći sadržaj u VALIDAN JSON objekat tačno po zadatoj šemi.
Vrati ISKLJUČIVO JSON (bez dodatnog teksta).

Schema:
{
  "intent": "greeting|branches_hours|branches_list|appointments_help|appointments_slots|fx_rate|docs_required|faq|unknown",
  "reply": "kratak i koristan odgovor na srpskom",
  "link": "opciono, ili prazno"
}

Sadržaj za popravku:"#;

/// Compose the final user message: state payload and free-text context are
/// labeled as the source of truth, the literal question comes last. Empty
/// sections are omitted.
pub fn build_user_content(user_message: &str, context: &str, state: Option<&Value>) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(state) = state {
        if !state.is_null() {
            parts.push(format!(
                "STATE (pouzdan izvor istine):\n{}",
                serde_json::to_string(state).unwrap_or_else(|_| "{}".to_string())
            ));
        }
    }

    let context = context.trim();
    if !context.is_empty() {
        parts.push(format!("KONTEKST (pouzdan izvor istine):\n{}", context));
    }

    parts.push(format!("PITANJE KORISNIKA:\n{}", user_message.trim()));

    parts.join("\n\n").trim().to_string()
}

/// Build the ordered message sequence: system prompt, then the last
/// `max_history_turns` history turns (user/assistant with non-empty content
/// only, original order), then the composed user message.
pub fn assemble_messages(
    user_message: &str,
    context: &str,
    history: &[ChatTurn],
    state: Option<&Value>,
    max_history_turns: usize,
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];

    let start = history.len().saturating_sub(max_history_turns);
    for turn in &history[start..] {
        let content = turn.content.trim();
        if (turn.role == "user" || turn.role == "assistant") && !content.is_empty() {
            messages.push(ChatMessage {
                role: turn.role.clone(),
                content: content.to_string(),
            });
        }
    }

    messages.push(ChatMessage::user(build_user_content(
        user_message,
        context,
        state,
    )));

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn turn(role: &str, content: &str) -> ChatTurn {
        ChatTurn {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn user_content_orders_sections() {
        let state = json!({"filijala": "Novi Beograd", "datum": "2024-06-01"});
        let content = build_user_content("Koji su slobodni termini?", "Radno vreme: 8-17h", Some(&state));

        let state_pos = content.find("STATE (pouzdan izvor istine):").unwrap();
        let context_pos = content.find("KONTEKST (pouzdan izvor istine):").unwrap();
        let question_pos = content.find("PITANJE KORISNIKA:").unwrap();
        assert!(state_pos < context_pos);
        assert!(context_pos < question_pos);
        assert!(content.contains("Novi Beograd"));
        assert!(content.ends_with("Koji su slobodni termini?"));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let content = build_user_content("Zdravo", "", None);
        assert_eq!(content, "PITANJE KORISNIKA:\nZdravo");

        let content = build_user_content("Zdravo", "  ", None);
        assert!(!content.contains("KONTEKST"));
        assert!(!content.contains("STATE"));
    }

    #[test]
    fn history_is_windowed_to_most_recent_turns() {
        let history: Vec<ChatTurn> = (0..15)
            .map(|i| turn(if i % 2 == 0 { "user" } else { "assistant" }, &format!("poruka {}", i)))
            .collect();

        let messages = assemble_messages("pitanje", "", &history, None, 10);
        // system + 10 history + final user message
        assert_eq!(messages.len(), 12);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "poruka 5");
        assert_eq!(messages[10].content, "poruka 14");
        assert_eq!(messages[11].role, "user");
    }

    #[test]
    fn foreign_roles_and_blank_turns_are_dropped() {
        let history = vec![
            turn("system", "ignore me"),
            turn("user", "prva"),
            turn("assistant", "   "),
            turn("tool", "{}"),
            turn("assistant", "druga"),
        ];

        let messages = assemble_messages("pitanje", "", &history, None, 10);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].content, "prva");
        assert_eq!(messages[2].content, "druga");
    }

    #[test]
    fn window_is_applied_before_filtering() {
        // The window counts raw turns; role/content filtering happens after.
        let history = vec![
            turn("user", "stara"),
            turn("tool", "x"),
            turn("user", "nova"),
        ];
        let messages = assemble_messages("pitanje", "", &history, None, 2);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "nova");
    }
}
