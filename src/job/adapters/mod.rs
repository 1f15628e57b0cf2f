//! Adapter implementations for job pipeline ports.

pub mod gemini;
pub mod memory;
pub mod postgres;
