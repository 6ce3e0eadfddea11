//! Bias review of article text through an OpenAI-compatible completion API.
//!
//! # Architecture
//!
//! - [`TextService`]: one prompt in, one completion out
//! - [`OpenAiChat`]: [`TextService`] over the `/chat/completions` endpoint
//! - [`AnalysisTransformer`]: builds the review prompt for an article and
//!   sends it through any [`TextService`]
//!
//! Each article gets exactly one request. There is no streaming, no
//! follow-up turn and no retry; a failed call is reported to the caller.

use std::time::Instant;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::ServiceConfig;
use crate::error::{ConfigError, ServiceError};
use crate::utils::truncate_for_log;

/// Send a prompt to a generative-text backend and receive its completion.
pub trait TextService {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// Chat-completions client sending the prompt as a single user message.
pub struct OpenAiChat {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(service: &ServiceConfig) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(service.timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", service.base_url.trim_end_matches('/')),
            api_key: service.api_key.clone(),
            model: service.model.clone(),
        })
    }
}

impl std::fmt::Debug for OpenAiChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChat")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

impl TextService for OpenAiChat {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let t0 = Instant::now();
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.trim())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let dt = t0.elapsed();

        if !status.is_success() {
            warn!(
                elapsed_ms = dt.as_millis() as u64,
                status = status.as_u16(),
                body = %truncate_for_log(&text, 300),
                "Completion request rejected"
            );
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        info!(elapsed_ms = dt.as_millis() as u64, bytes = text.len(), "Completion received");
        parse_completion(&text)
    }
}

/// Pull the first choice's message text out of a chat-completions response.
pub fn parse_completion(body: &str) -> Result<String, ServiceError> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ServiceError::EmptyCompletion)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Build the bias-review prompt for one article.
pub fn build_prompt(title: &str, content: &str) -> String {
    format!(
        "\nPlease analyze the following BBC News article for bias and impartiality. \
         Point out any weaknesses, suggest improvements, and provide an expanded or \
         revised version of the article that addresses these issues.\n\
         \n\
         Article Title: {title}\n\
         \n\
         Article Content:\n\
         {content}\n"
    )
}

/// Turns extracted article text into the service's bias review.
#[derive(Debug)]
pub struct AnalysisTransformer<S> {
    service: S,
}

impl<S: TextService> AnalysisTransformer<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    #[instrument(level = "info", skip_all, fields(%title))]
    pub async fn transform(&self, title: &str, content: &str) -> Result<String, ServiceError> {
        let prompt = build_prompt(title, content);
        let analysis = self.service.complete(&prompt).await?;
        info!(bytes = analysis.len(), "Received analysis");
        Ok(analysis)
    }

    #[cfg(test)]
    pub(crate) fn service(&self) -> &S {
        &self.service
    }
}
