use thiserror::Error;

/// Why a round trip to the answer service produced no usable payload.
#[derive(Debug, Error)]
pub enum AnswerServiceError {
    #[error("answer service request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("answer service returned status {status}")]
    Status { status: u16 },
    #[error("answer service returned a non-JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid answer endpoint '{value}': {source}")]
    InvalidEndpoint {
        value: String,
        source: url::ParseError,
    },
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
