//! # Text Generation Module
//!
//! The generation collaborator turns a `(system role, category, brief, edit notes)`
//! request into a text artifact. Two implementations are provided:
//!
//! - [`TemplateGenerator`]: deterministic template lookup, never fails
//! - [`OpenAiGenerator`]: any OpenAI-compatible chat completions endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{GenerationConfig, OpenAiConfig};
use crate::dialogue::Category;
use crate::templates;

pub const DEFAULT_SYSTEM_ROLE: &str = "You are a professional copywriter.";

/// Longest excerpt of a provider error body kept in [`GenerationError::Api`]
pub const MAX_ERROR_BODY_CHARS: usize = 200;

/// Everything the generator needs to produce one artifact
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system_role: String,
    pub category: Category,
    pub brief: String,
    pub edit_notes: Option<String>,
}

impl GenerationRequest {
    pub fn new(category: Category, brief: impl Into<String>) -> Self {
        Self {
            system_role: DEFAULT_SYSTEM_ROLE.to_string(),
            category,
            brief: brief.into(),
            edit_notes: None,
        }
    }

    pub fn with_edit_notes(mut self, edit_notes: impl Into<String>) -> Self {
        self.edit_notes = Some(edit_notes.into());
        self
    }

    /// User message sent to a chat model
    pub fn user_prompt(&self) -> String {
        let mut prompt = format!(
            "Напиши {}.\n\nОписание задачи: {}",
            self.category.task_description(),
            self.brief
        );
        if let Some(notes) = &self.edit_notes {
            prompt.push_str("\n\nУчти правки к предыдущему варианту: ");
            prompt.push_str(notes);
        }
        prompt
    }
}

/// Failure of the generation collaborator
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP client error: {0}")]
    Client(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("model returned an empty completion")]
    EmptyCompletion,
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GenerationError::InvalidResponse(err.to_string())
        } else {
            GenerationError::Network(err.to_string())
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Template lookup by category with the brief spliced in
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateGenerator;

#[async_trait]
impl TextGenerator for TemplateGenerator {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        Ok(match &request.edit_notes {
            Some(notes) => templates::render_revision(&request.brief, notes),
            None => templates::render(request.category, &request.brief),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
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
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiGenerator {
    pub fn new(config: &OpenAiConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GenerationError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let user_prompt = request.user_prompt();
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_role,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
        };

        debug!(
            model = %self.model,
            category = request.category.key(),
            has_edit_notes = request.edit_notes.is_some(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Chat completion request failed");
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body: error_excerpt(&body),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::InvalidResponse("no choices in response".to_string()))?
            .message
            .content
            .unwrap_or_default();

        let content = content.trim();
        if content.is_empty() {
            return Err(GenerationError::EmptyCompletion);
        }

        Ok(content.to_string())
    }
}

/// Bounded, trimmed excerpt of a provider error body
fn error_excerpt(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let mut excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    excerpt.push('…');
    excerpt
}

/// Pick the generator for the configuration: OpenAI when a key is set, templates otherwise
pub fn build_generator(config: &GenerationConfig) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    match &config.openai {
        Some(openai) => {
            let generator = OpenAiGenerator::new(openai)?;
            info!(model = %openai.model, endpoint = %generator.endpoint(), "Using OpenAI text generator");
            Ok(Arc::new(generator))
        }
        None => {
            info!("No OpenAI key configured, using template text generator");
            Ok(Arc::new(TemplateGenerator))
        }
    }
}
