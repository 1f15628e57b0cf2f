//! Port contracts for the job pipeline.

pub mod database;
pub mod language_model;
pub mod queue;
pub mod session_store;

pub use database::{DatabaseError, DatabaseResult, QueryExecutor, SchemaIntrospector};
pub use language_model::{LanguageModel, LanguageModelError, LanguageModelResult};
pub use queue::{
    Delivery, DeliveryReceipt, GENERATION_QUEUE, JobQueue, QueueError, QueueResult,
    VALIDATION_QUEUE,
};
pub use session_store::{SessionStore, SessionStoreError, SessionStoreResult};
