//! Datalab service: HTTP intake plus the generation and validation workers.
//!
//! Configuration is read from the environment (see [`Config::from_env`]).
//! Schema migrations for the session store and queues are applied before
//! anything starts serving.

use datalab::{
    api::{self, AppState},
    config::Config,
    job::{
        adapters::{
            gemini::GeminiClient,
            postgres::{
                PgPool, PostgresJobQueue, PostgresSessionStore, PostgresTargetDatabase,
                run_pending_migrations,
            },
        },
        domain::{GenerationRequest, ValidationRequest},
        ports::{GENERATION_QUEUE, VALIDATION_QUEUE},
        services::{
            ExecutionService, GenerationService, IntakeService, RetryingQueryExecutor,
            SessionQueryService,
        },
    },
    telemetry,
    worker::StageWorker,
};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    telemetry::init();
    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        model = %config.gemini.model,
        target_host = %config.target.host,
        "starting datalab"
    );

    let pool = connect_store(config.store_url.expose().to_owned()).await?;

    let generation_queue = Arc::new(PostgresJobQueue::<GenerationRequest>::new(
        pool.clone(),
        GENERATION_QUEUE,
        config.visibility_timeout,
    ));
    let validation_queue = Arc::new(PostgresJobQueue::<ValidationRequest>::new(
        pool.clone(),
        VALIDATION_QUEUE,
        config.visibility_timeout,
    ));
    let store = Arc::new(PostgresSessionStore::new(pool));
    let target = Arc::new(PostgresTargetDatabase::new(config.target.clone()));
    let model = Arc::new(GeminiClient::new(config.gemini.clone())?);

    let generation = Arc::new(GenerationService::new(
        Arc::clone(&target),
        Arc::clone(&model),
        Arc::clone(&validation_queue),
    ));
    let execution = Arc::new(ExecutionService::new(
        Arc::new(RetryingQueryExecutor::new(target, config.retry)),
        model,
        Arc::clone(&store),
        Arc::new(DefaultClock),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let generation_worker = tokio::spawn(
        StageWorker::<GenerationRequest, _, _>::new(
            Arc::clone(&generation_queue),
            generation,
            config.poll_interval,
        )
        .run(shutdown_rx.clone()),
    );
    let validation_worker = tokio::spawn(
        StageWorker::<ValidationRequest, _, _>::new(
            validation_queue,
            execution,
            config.poll_interval,
        )
        .run(shutdown_rx),
    );

    let state = AppState::new(
        IntakeService::new(generation_queue),
        SessionQueryService::new(store),
    );
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(bind_addr = %config.bind_addr, "listening");
    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Workers that already exited have dropped their receivers.
    shutdown_tx.send(true).ok();
    generation_worker.await?;
    validation_worker.await?;
    info!("datalab stopped");
    Ok(())
}

async fn connect_store(store_url: String) -> Result<PgPool, BoxError> {
    tokio::task::spawn_blocking(move || -> Result<PgPool, BoxError> {
        let built = Pool::builder().build(ConnectionManager::<PgConnection>::new(store_url))?;
        run_pending_migrations(&built)?;
        Ok(built)
    })
    .await?
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
