use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{AnswerQuery, AnswerResponse};
use url::Url;

use crate::{
    config::WidgetSettings,
    error::{AnswerServiceError, ConfigError},
};

/// A payload the service actually returned, as opposed to a transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Answered(String),
    /// `success: false`, or JSON that does not have the answer shape.
    Declined,
}

#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn ask(&self, query: &AnswerQuery) -> Result<AnswerOutcome, AnswerServiceError>;
}

pub struct HttpAnswerService {
    http: Client,
    endpoint: Url,
}

impl HttpAnswerService {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: Client::new(),
            endpoint,
        }
    }

    pub fn from_settings(settings: &WidgetSettings) -> Result<Self, ConfigError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint: settings.answer_endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl AnswerService for HttpAnswerService {
    async fn ask(&self, query: &AnswerQuery) -> Result<AnswerOutcome, AnswerServiceError> {
        let res = self
            .http
            .get(self.endpoint.clone())
            .query(&query.params())
            .send()
            .await?;
        let status = res.status();
        let body = res.bytes().await?;
        classify_body(status, &body)
    }
}

/// Only a body that is not JSON at all counts as a transport failure. Any JSON
/// body is interpreted, whatever the status, and declines unless answer-shaped.
fn classify_body(
    status: reqwest::StatusCode,
    body: &[u8],
) -> Result<AnswerOutcome, AnswerServiceError> {
    let value = match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => value,
        Err(_) if !status.is_success() => {
            return Err(AnswerServiceError::Status {
                status: status.as_u16(),
            })
        }
        Err(err) => return Err(AnswerServiceError::Decode(err)),
    };

    Ok(serde_json::from_value::<AnswerResponse>(value)
        .ok()
        .and_then(AnswerResponse::into_answer)
        .map_or(AnswerOutcome::Declined, AnswerOutcome::Answered))
}
