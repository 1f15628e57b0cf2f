//! Shared world state for query pipeline BDD scenarios.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use datalab::{
    api::{AppState, router},
    job::{
        adapters::memory::{InMemoryJobQueue, InMemorySessionStore},
        domain::{
            CorrelationId, GenerationRequest, JobRecord, ResultRow, SchemaDescriptor,
            ValidationRequest,
        },
        ports::{
            DatabaseError, DatabaseResult, LanguageModel, LanguageModelResult, QueryExecutor,
            SchemaIntrospector, SessionStore,
        },
        services::{ExecutionService, GenerationService, IntakeService, SessionQueryService},
    },
    worker::{PollOutcome, StageWorker},
};
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::json;

/// Catalogue of the sample products database.
#[derive(Default)]
pub struct SampleCatalog {
    pub unavailable: AtomicBool,
}

#[async_trait]
impl SchemaIntrospector for SampleCatalog {
    async fn fetch_schema(&self) -> DatabaseResult<SchemaDescriptor> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DatabaseError::transient("catalogue unreachable"));
        }
        Ok(SchemaDescriptor::from_columns([
            ("products", "product_name", "text"),
            ("products", "price", "numeric"),
        ]))
    }
}

/// Executor returning three product rows and counting invocations.
#[derive(Default)]
pub struct SampleExecutor {
    pub calls: AtomicUsize,
}

#[async_trait]
impl QueryExecutor for SampleExecutor {
    async fn execute(&self, _sql: &str) -> DatabaseResult<Vec<ResultRow>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok([("Laptop", 999), ("Phone", 599), ("Tablet", 399)]
            .into_iter()
            .filter_map(|(name, price)| {
                json!({"product_name": name, "price": price})
                    .as_object()
                    .cloned()
            })
            .collect())
    }
}

/// Model that answers by recognising which prompt it was sent.
pub struct PromptAwareModel;

#[async_trait]
impl LanguageModel for PromptAwareModel {
    async fn generate(&self, prompt: &str) -> LanguageModelResult<String> {
        let reply = if prompt.starts_with("Explain") {
            "Lists the most expensive products."
        } else if prompt.contains("Summary:") {
            "Laptop, Phone, and Tablet are the priciest products."
        } else if prompt.contains("delete all products") {
            "```sql\nDELETE FROM products\n```"
        } else {
            "```sql\nSELECT product_name, price FROM products ORDER BY price DESC LIMIT 3\n```"
        };
        Ok(reply.to_owned())
    }

    fn model_name(&self) -> &str {
        "prompt-aware"
    }
}

type GenerationQueue = InMemoryJobQueue<GenerationRequest>;
type ValidationQueue = InMemoryJobQueue<ValidationRequest>;
type GenerationWorker = StageWorker<
    GenerationRequest,
    GenerationQueue,
    GenerationService<SampleCatalog, PromptAwareModel, ValidationQueue>,
>;
type ValidationWorker = StageWorker<
    ValidationRequest,
    ValidationQueue,
    ExecutionService<SampleExecutor, PromptAwareModel, InMemorySessionStore, DefaultClock>,
>;

/// Scenario world wiring the full pipeline over in-memory adapters.
pub struct PipelineWorld {
    pub router: Router,
    pub generation_queue: Arc<GenerationQueue>,
    pub store: Arc<InMemorySessionStore>,
    pub catalog: Arc<SampleCatalog>,
    pub executor: Arc<SampleExecutor>,
    generation_worker: GenerationWorker,
    validation_worker: ValidationWorker,
    pub submitted_question: Option<String>,
    pub last_status: Option<u16>,
    pub last_correlation_id: Option<CorrelationId>,
}

impl PipelineWorld {
    /// Creates a world with empty queues and store.
    #[must_use]
    pub fn new() -> Self {
        let generation_queue = Arc::new(GenerationQueue::new());
        let validation_queue = Arc::new(ValidationQueue::new());
        let store = Arc::new(InMemorySessionStore::new());
        let catalog = Arc::new(SampleCatalog::default());
        let executor = Arc::new(SampleExecutor::default());
        let model = Arc::new(PromptAwareModel);

        let generation = GenerationService::new(
            Arc::clone(&catalog),
            Arc::clone(&model),
            Arc::clone(&validation_queue),
        );
        let execution = ExecutionService::new(
            Arc::clone(&executor),
            model,
            Arc::clone(&store),
            Arc::new(DefaultClock),
        );
        let poll_interval = Duration::from_millis(10);

        Self {
            router: router(AppState::new(
                IntakeService::new(Arc::clone(&generation_queue)),
                SessionQueryService::new(Arc::clone(&store)),
            )),
            generation_worker: StageWorker::new(
                Arc::clone(&generation_queue),
                Arc::new(generation),
                poll_interval,
            ),
            validation_worker: StageWorker::new(
                validation_queue,
                Arc::new(execution),
                poll_interval,
            ),
            generation_queue,
            store,
            catalog,
            executor,
            submitted_question: None,
            last_status: None,
            last_correlation_id: None,
        }
    }

    /// Runs both stage workers until neither queue yields a delivery.
    pub fn drain(&self) -> Result<(), eyre::Report> {
        run_async(async {
            loop {
                let generated = self.generation_worker.process_next().await?;
                let validated = self.validation_worker.process_next().await?;
                if generated != PollOutcome::Acknowledged
                    && validated != PollOutcome::Acknowledged
                {
                    return Ok(());
                }
            }
        })
    }

    /// Returns the terminal record for the last accepted submission.
    pub fn terminal_record(&self) -> Result<JobRecord, eyre::Report> {
        let id = self
            .last_correlation_id
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no submission was accepted"))?;
        run_async(self.store.find_by_id(id))?
            .ok_or_else(|| eyre::eyre!("no terminal record for {id}"))
    }
}

impl Default for PipelineWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> PipelineWorld {
    PipelineWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
