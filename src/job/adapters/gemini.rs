//! Google Gemini adapter for the language-model port.

use crate::job::ports::{LanguageModel, LanguageModelError, LanguageModelResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Default Gemini REST endpoint for model resources.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default Gemini model identifier.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection settings for [`GeminiClient`].
#[derive(Clone, PartialEq, Eq)]
pub struct GeminiSettings {
    /// API credential sent with every request.
    pub api_key: String,
    /// Model identifier, for example `gemini-2.5-flash`.
    pub model: String,
    /// Base URL under which `{model}:generateContent` is resolved.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GeminiSettings {
    /// Creates settings with the default model, endpoint, and timeout.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_owned(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_owned(),
            timeout: Duration::from_secs(60),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

fn request_body(prompt: &str) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: [Content {
            parts: [RequestPart { text: prompt }],
        }],
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> LanguageModelResult<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(LanguageModelError::EmptyResponse);
    }
    Ok(text)
}

/// HTTP client for the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    settings: GeminiSettings,
    client: Client,
}

impl GeminiClient {
    /// Creates a client from settings.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageModelError::MissingApiKey`] when the key is blank, or
    /// [`LanguageModelError::Transport`] when the HTTP client cannot be built.
    pub fn new(settings: GeminiSettings) -> LanguageModelResult<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(LanguageModelError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(LanguageModelError::transport)?;

        Ok(Self { settings, client })
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> LanguageModelResult<String> {
        debug!(model = %self.settings.model, prompt_len = prompt.len(), "calling Gemini");

        let response = self
            .client
            .post(self.settings.endpoint())
            .header(API_KEY_HEADER, &self.settings.api_key)
            .json(&request_body(prompt))
            .send()
            .await
            .map_err(LanguageModelError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LanguageModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(LanguageModelError::transport)?;
        extract_text(payload)
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}
