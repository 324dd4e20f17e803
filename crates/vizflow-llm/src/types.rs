use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: Some(content.into()),
        }
    }

    pub fn text_content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Text of the first choice, which is all this service reads.
    pub fn first_text(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.message.text_content())
    }
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: Message,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "m".to_string(),
            temperature: Some(0.25),
            max_tokens: Some(600),
            messages: vec![Message::system("sys"), Message::user("hi")],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "m");
        assert_eq!(value["max_tokens"], 600);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_response_first_text() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": "{\"steps\": []}"}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_text(), Some(r#"{"steps": []}"#));
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_response_without_choices_has_no_text() {
        let response: ChatResponse = serde_json::from_str(r#"{"id": "x", "choices": []}"#).unwrap();
        assert_eq!(response.first_text(), None);
    }
}
