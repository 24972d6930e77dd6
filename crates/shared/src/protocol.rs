use serde::{Deserialize, Serialize};

pub const DEFAULT_ANSWER_PATH: &str = "/api/chatbot/";
pub const GREETING_TOPIC: &str = "greeting";

/// What a single round trip asks the answer service about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerQuery {
    /// Free text typed by the visitor.
    Text(String),
    /// A canned topic key such as `greeting` or `fees`.
    Topic(String),
}

impl AnswerQuery {
    pub fn greeting() -> Self {
        Self::Topic(GREETING_TOPIC.to_string())
    }

    pub fn params(&self) -> AnswerQueryParams<'_> {
        match self {
            Self::Text(text) => AnswerQueryParams {
                query: Some(text),
                topic: None,
            },
            Self::Topic(key) => AnswerQueryParams {
                query: None,
                topic: Some(key),
            },
        }
    }
}

/// Query-string form of [`AnswerQuery`]; unset parameters are omitted, never sent empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnswerQueryParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<&'a str>,
}

/// Body returned by the answer service. Extra fields (`topic`, `data`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnswerResponse {
    pub fn declined() -> Self {
        Self {
            success: false,
            message: None,
        }
    }

    /// The answer text, if the service reported success and supplied one.
    pub fn into_answer(self) -> Option<String> {
        match (self.success, self.message) {
            (true, Some(message)) => Some(message),
            _ => None,
        }
    }
}
