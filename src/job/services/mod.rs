//! Application services for the job pipeline stages.

mod execution;
mod generation;
mod history;
mod intake;
pub mod prompts;
mod retry;

pub use execution::{ExecutionError, ExecutionResult, ExecutionService};
pub use generation::{GenerationError, GenerationResult, GenerationService};
pub use history::{JobStatusView, SessionQueryService};
pub use intake::{IntakeError, IntakeResult, IntakeService};
pub use retry::{RetryPolicy, RetryingQueryExecutor};
