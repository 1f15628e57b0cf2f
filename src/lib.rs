//! Datalab: natural-language questions answered with generated SQL.
//!
//! A question submitted over HTTP is queued, turned into a candidate
//! `PostgreSQL` statement by a hosted language model, checked against a
//! keyword denylist, executed against a read-only target database, and
//! summarised. Every question ends in exactly one terminal session record
//! that clients poll by correlation identifier.
//!
//! # Architecture
//!
//! Datalab follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, APIs, etc.)
//!
//! # Modules
//!
//! - [`job`]: Pipeline domain, ports, adapters, and stage services
//! - [`worker`]: Queue-driven stage workers
//! - [`api`]: HTTP routes for submission, status, and history
//! - [`config`]: Environment configuration

pub mod api;
pub mod config;
pub mod job;
pub mod telemetry;
pub mod worker;
