//! Gemini `generateContent` REST client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerationError;

use super::LanguageModel;

/// Public Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for a single Gemini model.
///
/// No request timeout is set and failed calls are never retried.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, GenerationError> {
        let http = Client::builder()
            .user_agent(concat!("scribe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GenerationError::ClientBuild)?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API host (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateRequest {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };

        debug!("Calling model {} ({} chars of prompt)", self.model, prompt.len());

        let response = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(GenerationError::Request)?;

        let status = response.status();
        let text = response.text().await.map_err(GenerationError::Request)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| text.trim().to_string());
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        parse_response(&text)
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_response(body: &str) -> Result<String, GenerationError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::InvalidResponse("no candidates returned".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    Ok(text)
}
