use serde::Serialize;

use crate::mapping::domain::CanonicalKey;
use crate::mapping::transform::TransformName;

pub const SYSTEM_INSTRUCTION: &str = "You are a JSON-only assistant. Always respond with valid JSON arrays only. No explanation, no markdown.";

const INPUT_KINDS: &str = "text|select|file|radio|checkbox|textarea";

/// Chat-style request understood by the local model server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub options: ChatOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChatOptions {
    pub temperature: f64,
    pub num_predict: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            num_predict: 4096,
        }
    }
}

impl ChatRequest {
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|message| message.role == "user")
            .map(|message| message.content.as_str())
    }
}

pub fn build_request(model: &str, markup: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_INSTRUCTION.to_string(),
            },
            ChatMessage {
                role: "user",
                content: user_prompt(markup),
            },
        ],
        stream: false,
        options: ChatOptions::default(),
    }
}

fn user_prompt(markup: &str) -> String {
    let keys = CanonicalKey::ALL
        .iter()
        .map(|key| key.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let transforms = TransformName::ALL
        .iter()
        .map(|name| name.as_str())
        .collect::<Vec<_>>()
        .join("|");

    format!(
        "You are analyzing a university admission form. Map each visible input field to a \
student profile key.\n\
\n\
Available profile keys: {keys}\n\
\n\
Return ONLY a JSON array with one object per field:\n\
[{{\"selector\": \"CSS selector for the input\", \"profileKey\": \"one of the keys above\", \
\"label\": \"visible label text\", \"required\": true, \"inputType\": \"{INPUT_KINDS}\", \
\"transform\": null}}]\n\
\n\
\"transform\" is null or one of: {transforms}.\n\
Prefer [name=\"...\"] selectors, fall back to #id. Skip fields that match no profile key.\n\
\n\
Form HTML:\n\
{markup}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_vocabulary_and_markup() {
        let request = build_request("llama3", r#"<input name="FullName">"#);
        assert_eq!(request.model, "llama3");
        assert!(!request.stream);
        assert_eq!(request.messages[0].role, "system");

        let prompt = request.user_prompt().expect("user message");
        assert!(prompt.contains("full_name, first_name"));
        assert!(prompt.contains("cnic_dashes"));
        assert!(prompt.ends_with(r#"<input name="FullName">"#));
    }

    #[test]
    fn request_serializes_to_chat_wire_shape() {
        let value = serde_json::to_value(build_request("llama3", "<form></form>"))
            .expect("serializes");
        assert_eq!(value["stream"], serde_json::json!(false));
        assert_eq!(value["options"]["num_predict"], serde_json::json!(4096));
        assert_eq!(value["messages"][1]["role"], serde_json::json!("user"));
    }
}
