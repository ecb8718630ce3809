//! HTTP client for the Conversary backend.
//!
//! Every call is a single attempt: no retries, no timeouts, no cancellation.
//! A non-2xx status is always an error, with the body kept for logging.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header::ACCEPT, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error! status: {status}")]
    Status {
        status: StatusCode,
        body: Option<serde_json::Value>,
    },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// The `detail` field FastAPI puts in error bodies, if there is one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { body: Some(body), .. } => {
                body.get("detail").and_then(|detail| detail.as_str())
            }
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request(err) => err.status(),
            ApiError::Decode(_) => None,
        }
    }
}

#[derive(Serialize)]
struct ConversationRequest<'a> {
    user_message: &'a str,
}

/// What the backend sends back after storing a new exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reply {
    pub ai_response: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// One stored exchange: a user message and the AI response to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConversationTurn {
    pub user_message: String,
    pub ai_response: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRequest {
    pub summary_text: String,
    pub sentiment_score: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SummaryCreated {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailySummary {
    pub id: i64,
    pub date: NaiveDate,
    pub summary_text: String,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The two calls the chat screen depends on.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    async fn submit_message(&self, text: &str) -> Result<Reply, ApiError>;
    async fn list_conversations(&self) -> Result<Vec<ConversationTurn>, ApiError>;
}

#[derive(Clone)]
pub struct ConversationClient {
    client: Client,
    base_url: String,
}

impl ConversationClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub async fn conversations_on(&self, date: NaiveDate) -> Result<Vec<ConversationTurn>, ApiError> {
        let url = self.url(&format!("conversations/{date}"));
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn create_summary(&self, summary: &SummaryRequest) -> Result<SummaryCreated, ApiError> {
        let url = self.url("summaries/");
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(summary)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn summary_for(&self, date: NaiveDate) -> Result<DailySummary, ApiError> {
        let url = self.url(&format!("summaries/{date}"));
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl ConversationApi for ConversationClient {
    async fn submit_message(&self, text: &str) -> Result<Reply, ApiError> {
        let url = self.url("conversations/");
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(&ConversationRequest { user_message: text })
            .send()
            .await?;
        read_json(response).await
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationTurn>, ApiError> {
        let url = self.url("conversations/");
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let url = response.url().to_string();
        let body = response.json::<serde_json::Value>().await.ok();
        tracing::error!(status = status.as_u16(), body = ?body, %url, "Response error");
        return Err(ApiError::Status { status, body });
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
