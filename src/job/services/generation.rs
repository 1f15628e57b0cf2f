//! Generation stage: question to candidate SQL plus explanation.

use super::prompts::{self, PromptError};
use crate::job::{
    domain::{GeneratedSql, GenerationRequest, ValidationRequest},
    ports::{
        DatabaseError, JobQueue, LanguageModel, LanguageModelError, QueueError,
        SchemaIntrospector,
    },
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Errors raised while producing a candidate statement.
///
/// Only [`GenerationError::Queue`] escapes [`GenerationService::handle`]; the
/// other variants are converted into a sentinel hand-off.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Schema introspection failed.
    #[error("schema introspection failed: {0}")]
    Schema(#[from] DatabaseError),

    /// A prompt could not be rendered.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// The language model call failed.
    #[error("language model call failed: {0}")]
    Model(#[from] LanguageModelError),

    /// The model output normalised to an empty statement.
    #[error("language model produced an empty statement")]
    EmptyStatement,

    /// The validation queue rejected the hand-off.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Result type for generation operations.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Generation stage orchestration.
#[derive(Clone)]
pub struct GenerationService<S, L, Q>
where
    S: SchemaIntrospector,
    L: LanguageModel,
    Q: JobQueue<ValidationRequest>,
{
    introspector: Arc<S>,
    model: Arc<L>,
    queue: Arc<Q>,
}

impl<S, L, Q> GenerationService<S, L, Q>
where
    S: SchemaIntrospector,
    L: LanguageModel,
    Q: JobQueue<ValidationRequest>,
{
    /// Creates a generation service.
    #[must_use]
    pub const fn new(introspector: Arc<S>, model: Arc<L>, queue: Arc<Q>) -> Self {
        Self {
            introspector,
            model,
            queue,
        }
    }

    /// Produces exactly one validation message for `request` and enqueues it.
    ///
    /// Any failure before the hand-off yields a message carrying the
    /// generation-failure sentinel and an empty explanation.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Queue`] when the hand-off fails.
    pub async fn handle(&self, request: &GenerationRequest) -> GenerationResult<ValidationRequest> {
        let message = match self.generate(request).await {
            Ok((sql, explanation)) => ValidationRequest::generated(request, sql, explanation),
            Err(err) => {
                error!(
                    correlation_id = %request.correlation_id,
                    error = %err,
                    "SQL generation failed"
                );
                ValidationRequest::generation_failed(request)
            }
        };

        self.queue.enqueue(&message).await?;
        info!(
            correlation_id = %request.correlation_id,
            sentinel = message.generated_sql.is_sentinel(),
            "validation job enqueued"
        );
        Ok(message)
    }

    async fn generate(&self, request: &GenerationRequest) -> GenerationResult<(GeneratedSql, String)> {
        let schema = self.introspector.fetch_schema().await?;
        info!(
            correlation_id = %request.correlation_id,
            tables = schema.table_count(),
            "schema fetched"
        );

        let sql_prompt = prompts::sql_generation_prompt(&schema, &request.user_question)?;
        let raw_sql = self.model.generate(&sql_prompt).await?;
        let sql = GeneratedSql::from_model_output(&raw_sql);
        if sql.as_str().is_empty() {
            return Err(GenerationError::EmptyStatement);
        }
        info!(
            correlation_id = %request.correlation_id,
            model = self.model.model_name(),
            sql = sql.as_str(),
            "SQL generated"
        );

        let explanation_prompt = prompts::explanation_prompt(&sql)?;
        let explanation = self.model.generate(&explanation_prompt).await?;
        Ok((sql, explanation.trim().to_owned()))
    }
}
