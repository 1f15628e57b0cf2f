//! Route handlers for submission, status, and history.

use super::{ApiError, AppState};
use crate::job::{
    domain::{CorrelationId, GenerationRequest, JobRecord, JobStatus},
    ports::{JobQueue, SessionStore},
    services::JobStatusView,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

const ACCEPTED_MESSAGE: &str = "Request accepted and is being processed.";

#[derive(Deserialize)]
struct SubmitBody {
    #[serde(default)]
    question: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Accepted {
    message: &'static str,
    correlation_id: CorrelationId,
}

#[derive(Deserialize)]
pub(super) struct StatusParams {
    #[serde(default)]
    id: Option<String>,
}

/// `POST /api/query`
///
/// The body is parsed leniently: malformed JSON or a non-string question
/// reads as a missing question.
pub(super) async fn submit_query<Q, S>(
    State(state): State<AppState<Q, S>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Accepted>), ApiError>
where
    Q: JobQueue<GenerationRequest> + 'static,
    S: SessionStore + 'static,
{
    let question = serde_json::from_slice::<SubmitBody>(&body)
        .ok()
        .and_then(|parsed| parsed.question);
    let correlation_id = state.intake.submit(question.as_deref()).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(Accepted {
            message: ACCEPTED_MESSAGE,
            correlation_id,
        }),
    ))
}

/// `GET /api/status?id=<correlationId>`
pub(super) async fn job_status<Q, S>(
    State(state): State<AppState<Q, S>>,
    Query(params): Query<StatusParams>,
) -> Result<Response, ApiError>
where
    Q: JobQueue<GenerationRequest> + 'static,
    S: SessionStore + 'static,
{
    let id = params
        .id
        .and_then(|raw| CorrelationId::parse(raw).ok())
        .ok_or(ApiError::MissingId)?;

    let response = match state.sessions.status(&id).await? {
        JobStatusView::Completed(record) => (StatusCode::OK, Json(*record)).into_response(),
        JobStatusView::Processing => (
            StatusCode::ACCEPTED,
            Json(json!({ "status": JobStatus::Processing.as_str() })),
        )
            .into_response(),
    };
    Ok(response)
}

/// `GET /api/history`
pub(super) async fn session_history<Q, S>(
    State(state): State<AppState<Q, S>>,
) -> Result<Json<Vec<JobRecord>>, ApiError>
where
    Q: JobQueue<GenerationRequest> + 'static,
    S: SessionStore + 'static,
{
    Ok(Json(state.sessions.history().await?))
}
