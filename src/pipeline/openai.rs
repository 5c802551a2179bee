use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{
    EventExtractor, PageContent,
    client::Client,
    event::{EventRecord, EventSchema},
};
use crate::error::ExtractError;

pub const OPENAI_API_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f32 = 0.3;

const SYSTEM_PROMPT: &str = "You extract cinema screenings from calendar pages. \
Return a JSON object with an 'events' array holding one entry per screening listed on the page. \
Copy showtimes exactly as written. Use null for a guest or format the page does not state. \
If the page lists no screenings, return an empty 'events' array.";

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    response_format: Value,
    temperature: f32,
}

#[derive(Serialize, Debug)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct EventsEnvelope {
    events: Vec<EventRecord>,
}

/// [`EventExtractor`] backed by OpenAI chat completions in structured-output
/// mode.
pub struct OpenAiExtractor {
    client: Client,
    base_url: String,
    model: String,
}

impl OpenAiExtractor {
    pub fn new(api_key: &str) -> Self {
        OpenAiExtractor::with_client(Client::new(), OPENAI_API_URL, api_key)
    }

    pub fn with_client(client: Client, base_url: &str, api_key: &str) -> Self {
        OpenAiExtractor {
            client: client.with_bearer(api_key),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl EventExtractor for OpenAiExtractor {
    async fn extract(
        &self,
        content: &PageContent,
        schema: &EventSchema,
    ) -> Result<Vec<EventRecord>, ExtractError> {
        if content.markdown.trim().is_empty() {
            return Err(ExtractError::EmptyContent);
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: user_prompt(&content.markdown),
                },
            ],
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "strict": true,
                    "schema": schema.envelope_schema(),
                }
            }),
            temperature: TEMPERATURE,
        };

        info!(model = %self.model, "Calling OpenAI API");
        let response: ChatResponse = self
            .client
            .post_json(&format!("{}/v1/chat/completions", self.base_url), &request)
            .await?;

        let events = parse_completion(response)?;
        for event in events.iter().filter(|e| !e.is_corroborated_by(&content.markdown)) {
            warn!(
                film_title = %event.film_title,
                "Flagged as special without a guest, format or cue on the page"
            );
        }
        debug!(count = events.len(), "Completion parsed");
        Ok(events)
    }
}

fn user_prompt(markdown: &str) -> String {
    format!(
        "Analyze the following cinema calendar page and extract screening events.

For each event, determine:
- The film title
- The showtime (keep the original format)
- Whether it's a special event (true if it mentions: Q&A, Director, 35mm, 70mm, Premiere, or similar special programming)
- Any special guest name (if mentioned)
- The film format (if it's 35mm, 70mm, DCP, etc.)

Here is the calendar content:

{markdown}"
    )
}

fn parse_completion(response: ChatResponse) -> Result<Vec<EventRecord>, ExtractError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .ok_or(ExtractError::EmptyResponse)?
        .message;

    if let Some(refusal) = message.refusal {
        return Err(ExtractError::Refused(refusal));
    }
    let content = message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or(ExtractError::EmptyResponse)?;

    let envelope: EventsEnvelope = serde_json::from_str(strip_code_fence(&content))?;
    for (index, event) in envelope.events.iter().enumerate() {
        if event.film_title.trim().is_empty() {
            return Err(ExtractError::SchemaViolation {
                index,
                reason: "film_title is empty",
            });
        }
    }
    Ok(envelope.events)
}

/// Unwrap a ```` ```json ```` fence if the model added one anyway.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(content: &str) -> ChatResponse {
        ChatResponse {
            choices: vec![Choice {
                message: ChoiceMessage {
                    content: Some(content.to_string()),
                    refusal: None,
                },
            }],
        }
    }

    #[test]
    fn parses_events_envelope() {
        let events = parse_completion(completion(
            r#"{"events":[{"film_title":"Casablanca","showtime":"9:00 PM","is_special_event":false,"special_guest":null,"format":null}]}"#,
        ))
        .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].film_title, "Casablanca");
        assert_eq!(events[0].format, None);
    }

    #[test]
    fn empty_events_is_valid() {
        let events = parse_completion(completion(r#"{"events":[]}"#)).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let events = parse_completion(completion("```json\n{\"events\":[]}\n```")).unwrap();
        assert!(events.is_empty());
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }

    #[test]
    fn bare_array_is_not_coerced() {
        let err = parse_completion(completion("[]")).unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }

    #[test]
    fn wrong_types_are_malformed() {
        let err = parse_completion(completion(
            r#"{"events":[{"film_title":"Casablanca","showtime":"9:00 PM","is_special_event":"no","special_guest":null,"format":null}]}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }

    #[test]
    fn missing_keys_are_malformed() {
        let err = parse_completion(completion(
            r#"{"events":[{"film_title":"Casablanca","showtime":"9:00 PM","is_special_event":false}]}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }

    #[test]
    fn empty_title_violates_schema() {
        let err = parse_completion(completion(
            r#"{"events":[{"film_title":" ","showtime":"9:00 PM","is_special_event":false,"special_guest":null,"format":null}]}"#,
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::SchemaViolation { index: 0, .. }
        ));
    }

    #[test]
    fn refusal_is_an_error() {
        let response = ChatResponse {
            choices: vec![Choice {
                message: ChoiceMessage {
                    content: None,
                    refusal: Some("I can't help with that.".to_string()),
                },
            }],
        };
        assert!(matches!(
            parse_completion(response).unwrap_err(),
            ExtractError::Refused(_)
        ));
    }

    #[test]
    fn missing_choices_is_empty_response() {
        let err = parse_completion(ChatResponse { choices: vec![] }).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyResponse));
    }

    #[test]
    fn prompt_embeds_page() {
        assert!(user_prompt("CASABLANCA — 9:00 PM").ends_with("CASABLANCA — 9:00 PM"));
    }
}
