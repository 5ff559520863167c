use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::MatchData;

/// Call A: grounded web search for fixtures. No output schema, prompt-engineered JSON only.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub prompt: String,
    pub temperature: f32,
}

/// Call B: schema-constrained scoring of a fixture batch.
#[derive(Debug, Clone)]
pub struct ScoringRequest<'a> {
    pub prompt: String,
    pub schema: Value,
    pub temperature: f32,
    /// The batch behind `prompt`, typed, for implementations that score offline without a model.
    pub matches: &'a [MatchData],
}

/// The two things the pipeline asks of a generative model. Both return the raw reply text;
/// parsing and validation stay with the adapters.
#[async_trait]
pub trait MatchIntelligence: Send + Sync {
    async fn retrieve_matches(&self, request: &SearchRequest) -> Result<String>;

    async fn score_predictions(&self, request: &ScoringRequest<'_>) -> Result<String>;
}

// ── generateContent wire types ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, `None` when there is nothing to read.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// ── GeminiClient ──────────────────────────────────────────────────────────────

pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, body: Value) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);

        tracing::debug!("POST {} (model {})", url, self.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Service { status, body });
        }

        let reply: GenerateContentResponse = response.json().await?;
        reply.text().ok_or(AppError::EmptyReply)
    }
}

#[async_trait]
impl MatchIntelligence for GeminiClient {
    async fn retrieve_matches(&self, request: &SearchRequest) -> Result<String> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
            "tools": [{ "googleSearch": {} }],
            "generationConfig": { "temperature": request.temperature }
        });
        self.generate(body).await
    }

    async fn score_predictions(&self, request: &ScoringRequest<'_>) -> Result<String> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": request.schema,
                "temperature": request.temperature
            }
        });
        self.generate(body).await
    }
}
