//! Pipeline messages handed between stages through durable queues.

use super::{CorrelationId, GeneratedSql, UserQuestion};
use serde::{Deserialize, Serialize};

/// Error text attached to the hand-off when SQL generation fails.
pub const GENERATION_FAILURE_MESSAGE: &str = "Failed to generate SQL due to an internal error.";

/// Generation-stage input, produced by intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Correlation identifier minted at intake.
    pub correlation_id: CorrelationId,
    /// Original question text.
    pub user_question: UserQuestion,
}

impl GenerationRequest {
    /// Creates a request for a freshly accepted question, minting a new
    /// correlation identifier.
    #[must_use]
    pub fn new(user_question: UserQuestion) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            user_question,
        }
    }
}

/// Validation-stage input, produced by the generation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    /// Correlation identifier carried from intake.
    pub correlation_id: CorrelationId,
    /// Original question text.
    pub user_question: UserQuestion,
    /// Generated statement, or the sentinel on failure.
    pub generated_sql: GeneratedSql,
    /// One-sentence description of the statement; empty on failure.
    pub sql_explanation: String,
    /// Generation failure detail, present only with the sentinel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationRequest {
    /// Builds the hand-off for a successful generation.
    #[must_use]
    pub fn generated(
        request: &GenerationRequest,
        generated_sql: GeneratedSql,
        sql_explanation: impl Into<String>,
    ) -> Self {
        Self {
            correlation_id: request.correlation_id.clone(),
            user_question: request.user_question.clone(),
            generated_sql,
            sql_explanation: sql_explanation.into(),
            error: None,
        }
    }

    /// Builds the hand-off for a failed generation, carrying the sentinel.
    #[must_use]
    pub fn generation_failed(request: &GenerationRequest) -> Self {
        Self {
            correlation_id: request.correlation_id.clone(),
            user_question: request.user_question.clone(),
            generated_sql: GeneratedSql::sentinel(),
            sql_explanation: String::new(),
            error: Some(GENERATION_FAILURE_MESSAGE.to_owned()),
        }
    }
}
