//! Raw HTTP client for the Chat Completions API.
//!
//! No editor awareness. Makes API calls via reqwest and maps failures
//! onto [`CompletionError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::types::{split_completion_lines, ApiErrorBody, ChatMessage, ChatRequest, ChatResponse};
use super::CompletionProvider;
use crate::config::Config;
use crate::keystore::Credentials;

/// Errors from completion requests.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("quota exceeded (retry after {retry_after:?}s): {message}")]
    Quota {
        retry_after: Option<u64>,
        message: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl CompletionError {
    /// Classify a non-success HTTP status and its body.
    pub fn from_status(status: u16, retry_after: Option<u64>, body: &str) -> Self {
        let detail = serde_json::from_str::<ApiErrorBody>(body).ok().map(|b| b.error);
        let message = detail
            .as_ref()
            .map(|d| d.message.clone())
            .unwrap_or_else(|| body.trim().to_string());
        let quota_code = detail
            .as_ref()
            .and_then(|d| d.code.as_deref())
            .is_some_and(|c| c == "insufficient_quota");

        match status {
            401 | 403 => Self::Auth(message),
            429 => Self::Quota {
                retry_after,
                message,
            },
            _ if quota_code => Self::Quota {
                retry_after,
                message,
            },
            _ => Self::Network(format!("status {status}: {message}")),
        }
    }
}

/// HTTP client for an OpenAI-compatible chat endpoint.
#[derive(Debug)]
pub struct ChatClient {
    http: Client,
    api_key: String,
    organization: Option<String>,
    base_url: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl ChatClient {
    /// Create a client with default base URL (https://api.openai.com).
    pub fn new(api_key: String, model: &str) -> Self {
        Self::with_base_url(api_key, model, "https://api.openai.com".into())
    }

    /// Create a client with a custom base URL (for proxies and local servers).
    pub fn with_base_url(api_key: String, model: &str, base_url: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            organization: None,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
        }
    }

    /// Build from config and stored credentials. Fails without an API key.
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self, CompletionError> {
        let api_key = credentials.api_key.clone().ok_or_else(|| {
            CompletionError::Auth(
                "no API key stored; run `gptcomplete key set-api-key` or set OPENAI_API_KEY".into(),
            )
        })?;

        let mut client = Self::with_base_url(api_key, &config.model, config.base_url.clone())
            .with_organization(credentials.organization.clone());
        client.max_tokens = config.max_tokens;
        client.timeout = Duration::from_secs(config.timeout_secs);
        Ok(client)
    }

    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a chat request.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, CompletionError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut builder = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(request);
        if let Some(org) = &self.organization {
            builder = builder.header("OpenAI-Organization", org);
        }

        let response = tokio::time::timeout(self.timeout, builder.send())
            .await
            .map_err(|_| {
                CompletionError::Network(format!("no response within {}s", self.timeout.as_secs()))
            })??;

        let status = response.status().as_u16();
        if status >= 400 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_else(|_| "(no body)".into());
            return Err(CompletionError::from_status(status, retry_after, &body));
        }

        response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(format!("failed to parse response: {e}")))
    }
}

#[async_trait]
impl CompletionProvider for ChatClient {
    async fn complete(&self, prompt: &str) -> Result<Vec<String>, CompletionError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: Some(self.max_tokens),
            temperature: None,
        };

        info!(model = %self.model, "requesting completion");
        let response = self.chat(&request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }

        let text = response
            .text()
            .ok_or_else(|| CompletionError::MalformedResponse("response has no message content".into()))?;
        let lines = split_completion_lines(text);
        if lines.is_empty() {
            return Err(CompletionError::MalformedResponse("completion was empty".into()));
        }
        Ok(lines)
    }
}
