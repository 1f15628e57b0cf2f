//! Natural-language query jobs.
//!
//! A question travels through three stages connected by durable queues:
//! intake mints a correlation identifier, generation turns the question into
//! candidate SQL with an explanation, and validation gates, executes, and
//! summarises the statement before writing one terminal record. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
