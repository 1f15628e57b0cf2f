//! HTTP surface: question submission, status polling, and history.

mod error;
mod handlers;

pub use error::ApiError;

use crate::job::{
    domain::GenerationRequest,
    ports::{JobQueue, SessionStore},
    services::{IntakeService, SessionQueryService},
};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state.
pub struct AppState<Q, S>
where
    Q: JobQueue<GenerationRequest>,
    S: SessionStore,
{
    intake: Arc<IntakeService<Q>>,
    sessions: Arc<SessionQueryService<S>>,
}

impl<Q, S> AppState<Q, S>
where
    Q: JobQueue<GenerationRequest>,
    S: SessionStore,
{
    /// Creates handler state from the intake and query services.
    #[must_use]
    pub fn new(intake: IntakeService<Q>, sessions: SessionQueryService<S>) -> Self {
        Self {
            intake: Arc::new(intake),
            sessions: Arc::new(sessions),
        }
    }
}

impl<Q, S> Clone for AppState<Q, S>
where
    Q: JobQueue<GenerationRequest>,
    S: SessionStore,
{
    fn clone(&self) -> Self {
        Self {
            intake: Arc::clone(&self.intake),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

/// Builds the application router.
pub fn router<Q, S>(state: AppState<Q, S>) -> Router
where
    Q: JobQueue<GenerationRequest> + 'static,
    S: SessionStore + 'static,
{
    Router::new()
        .route("/api/query", post(handlers::submit_query::<Q, S>))
        .route("/api/status", get(handlers::job_status::<Q, S>))
        .route("/api/history", get(handlers::session_history::<Q, S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
