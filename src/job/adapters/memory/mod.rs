//! In-memory adapters for the job pipeline.

mod queue;
mod session_store;

pub use queue::InMemoryJobQueue;
pub use session_store::InMemorySessionStore;
