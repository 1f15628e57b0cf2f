//! Domain model for natural-language query jobs.
//!
//! A job carries one user question from intake, through SQL generation, to a
//! validated execution and a terminal record. The domain keeps all I/O
//! outside its boundary: safety validation and output normalisation are pure.

mod error;
mod ids;
mod message;
mod record;
pub mod safety;
mod schema;
mod sql;

pub use error::{JobDomainError, ParseJobStatusError};
pub use ids::{CorrelationId, UserQuestion};
pub use message::{GENERATION_FAILURE_MESSAGE, GenerationRequest, ValidationRequest};
pub use record::{
    EMPTY_RESULT_SUMMARY, JobRecord, JobStatus, PersistedJobRecord, ResultRow, SUMMARY_UNAVAILABLE,
};
pub use safety::{SafetyViolation, check_statement};
pub use schema::{ColumnSchema, SchemaDescriptor};
pub use sql::GeneratedSql;
