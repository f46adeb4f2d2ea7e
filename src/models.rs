use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Who said a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "AI Assistant",
        }
    }
}

/// A single line of the session transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Supporting FAQ entry returned alongside an answer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

impl Source {
    pub fn question_or_na(&self) -> &str {
        non_empty_or_na(&self.question)
    }

    pub fn answer_or_na(&self) -> &str {
        non_empty_or_na(&self.answer)
    }
}

fn non_empty_or_na(text: &str) -> &str {
    if text.trim().is_empty() { "N/A" } else { text }
}

/// Answer to one chat exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Source>,
}

impl Answer {
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}

/// Body of `POST /chat`
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

/// Reply of `POST /chat`
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
}

impl From<ChatResponse> for Answer {
    fn from(response: ChatResponse) -> Self {
        Answer {
            text: response.answer,
            sources: response.sources.unwrap_or_default(),
        }
    }
}

/// One stored exchange as served by the backend.
///
/// Fields the backend adds beyond the three we display are kept in `extra`
/// so an export writes back exactly what was served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryEntry {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            timestamp: timestamp.into(),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_response_without_sources_has_none() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"answer":"Overdraft fees are $35."}"#).unwrap();
        let answer = Answer::from(response);
        assert_eq!(answer.text, "Overdraft fees are $35.");
        assert!(!answer.has_sources());
    }

    #[test]
    fn null_sources_are_treated_as_empty() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"answer":"ok","sources":null}"#).unwrap();
        assert!(Answer::from(response).sources.is_empty());
    }

    #[test]
    fn source_with_missing_fields_displays_na() {
        let source: Source = serde_json::from_str(r#"{"question":"Hours?"}"#).unwrap();
        assert_eq!(source.question_or_na(), "Hours?");
        assert_eq!(source.answer_or_na(), "N/A");
    }

    #[test]
    fn history_entry_keeps_unknown_fields() {
        let raw = r#"{"question":"q","answer":"a","timestamp":"2024-05-01T09:30:00","user_id":"abc"}"#;
        let entry: HistoryEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.extra.get("user_id"), Some(&Value::from("abc")));

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back, serde_json::from_str::<Value>(raw).unwrap());
    }
}
