//! Terminal job records and their lifecycle status.

use super::{CorrelationId, GeneratedSql, ParseJobStatusError, UserQuestion, ValidationRequest};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One result row: column name to value, in result-schema column order.
pub type ResultRow = serde_json::Map<String, serde_json::Value>;

/// Summary stored when a query succeeds without returning rows.
pub const EMPTY_RESULT_SUMMARY: &str = "The query ran successfully but returned no results.";

/// Summary stored when rows were returned but summarisation failed.
pub const SUMMARY_UNAVAILABLE: &str =
    "The query ran successfully, but a summary of the results could not be generated.";

/// Lifecycle status of a job.
///
/// `Processing` is never persisted: it is reported for correlation
/// identifiers that do not yet have a terminal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// No terminal record exists yet.
    Processing,
    /// The statement executed and results were recorded.
    Succeeded,
    /// Generation, validation, or execution failed.
    Failed,
}

impl JobStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "Processing",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        }
    }

    /// Returns `true` for states written exactly once and never revised.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl TryFrom<&str> for JobStatus {
    type Error = ParseJobStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "Processing" => Ok(Self::Processing),
            "Succeeded" => Ok(Self::Succeeded),
            "Failed" => Ok(Self::Failed),
            _ => Err(ParseJobStatusError(value.to_owned())),
        }
    }
}

/// Terminal record for one user question, keyed by correlation identifier.
///
/// Serialises to the session document shape: `id`, `userQuestion`,
/// `generatedSql`, `sqlExplanation`, `status`, `error`, `results`,
/// `resultSummary`, `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    id: CorrelationId,
    user_question: UserQuestion,
    generated_sql: GeneratedSql,
    sql_explanation: String,
    status: JobStatus,
    error: Option<String>,
    results: Vec<ResultRow>,
    result_summary: String,
    timestamp: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted job record.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedJobRecord {
    /// Correlation identifier.
    pub id: CorrelationId,
    /// Original question.
    pub user_question: UserQuestion,
    /// Generated statement or sentinel.
    pub generated_sql: GeneratedSql,
    /// Statement explanation.
    pub sql_explanation: String,
    /// Terminal status.
    pub status: JobStatus,
    /// Failure reason, present only for failed jobs.
    pub error: Option<String>,
    /// Result rows.
    pub results: Vec<ResultRow>,
    /// Result summary.
    pub result_summary: String,
    /// Write time of the terminal record.
    pub timestamp: DateTime<Utc>,
}

impl JobRecord {
    /// Creates a successful terminal record.
    #[must_use]
    pub fn succeeded(
        request: &ValidationRequest,
        results: Vec<ResultRow>,
        result_summary: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: request.correlation_id.clone(),
            user_question: request.user_question.clone(),
            generated_sql: request.generated_sql.clone(),
            sql_explanation: request.sql_explanation.clone(),
            status: JobStatus::Succeeded,
            error: None,
            results,
            result_summary: result_summary.into(),
            timestamp: clock.utc(),
        }
    }

    /// Creates a failed terminal record with empty results and summary.
    #[must_use]
    pub fn failed(request: &ValidationRequest, error: impl Into<String>, clock: &impl Clock) -> Self {
        Self {
            id: request.correlation_id.clone(),
            user_question: request.user_question.clone(),
            generated_sql: request.generated_sql.clone(),
            sql_explanation: request.sql_explanation.clone(),
            status: JobStatus::Failed,
            error: Some(error.into()),
            results: Vec::new(),
            result_summary: String::new(),
            timestamp: clock.utc(),
        }
    }

    /// Reconstructs a record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedJobRecord) -> Self {
        Self {
            id: data.id,
            user_question: data.user_question,
            generated_sql: data.generated_sql,
            sql_explanation: data.sql_explanation,
            status: data.status,
            error: data.error,
            results: data.results,
            result_summary: data.result_summary,
            timestamp: data.timestamp,
        }
    }

    /// Returns the correlation identifier.
    #[must_use]
    pub const fn id(&self) -> &CorrelationId {
        &self.id
    }

    /// Returns the original question.
    #[must_use]
    pub const fn user_question(&self) -> &UserQuestion {
        &self.user_question
    }

    /// Returns the generated statement or sentinel.
    #[must_use]
    pub const fn generated_sql(&self) -> &GeneratedSql {
        &self.generated_sql
    }

    /// Returns the statement explanation.
    #[must_use]
    pub fn sql_explanation(&self) -> &str {
        &self.sql_explanation
    }

    /// Returns the terminal status.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        self.status
    }

    /// Returns the failure reason, if the job failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the result rows.
    #[must_use]
    pub fn results(&self) -> &[ResultRow] {
        &self.results
    }

    /// Returns the result summary.
    #[must_use]
    pub fn result_summary(&self) -> &str {
        &self.result_summary
    }

    /// Returns the write time of the record.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns `true` when `other` records the same outcome for the same job,
    /// ignoring the write timestamp and model-generated summary wording.
    #[must_use]
    pub fn is_equivalent_to(&self, other: &Self) -> bool {
        self.id == other.id
            && self.user_question == other.user_question
            && self.generated_sql == other.generated_sql
            && self.status == other.status
            && self.error == other.error
            && self.results == other.results
    }
}
