//! Language-model port: opaque text-in, text-out generation.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for language-model calls.
pub type LanguageModelResult<T> = Result<T, LanguageModelError>;

/// Hosted generation model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Sends a prompt and returns the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageModelError`] when the call fails or produces no text.
    async fn generate(&self, prompt: &str) -> LanguageModelResult<String>;

    /// Returns the configured model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Errors returned by language-model adapters.
#[derive(Debug, Clone, Error)]
pub enum LanguageModelError {
    /// No API credential was configured.
    #[error("language model API key is not configured")]
    MissingApiKey,

    /// The service answered with a non-success status.
    #[error("language model API returned status {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the service.
        body: String,
    },

    /// The response contained no generated text.
    #[error("language model returned an empty response")]
    EmptyResponse,

    /// Transport or decoding failure.
    #[error("language model transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl LanguageModelError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
