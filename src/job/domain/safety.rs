//! Lexical safety gate between generated SQL and a live database.
//!
//! The check is a case-insensitive substring match against a fixed denylist
//! of mutating and DDL keywords. It deliberately over-rejects: a keyword
//! inside a string literal or identifier (`updated_at`) also fails the gate.
//! Only statements that pass [`check_statement`] may reach a query executor.

use super::GeneratedSql;
use thiserror::Error;

/// Keywords whose presence anywhere in a statement causes rejection.
pub const DENYLIST: [&str; 7] = [
    "DROP", "DELETE", "INSERT", "UPDATE", "CREATE", "ALTER", "TRUNCATE",
];

/// Reason a statement was refused by the safety gate.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SafetyViolation {
    /// The statement is the generation-failure sentinel.
    #[error("validation failed: SQL generation did not produce a statement")]
    GenerationFailed,

    /// The statement contains a denylisted keyword.
    #[error("validation failed: generated SQL contains forbidden keyword {0}")]
    ForbiddenKeyword(&'static str),
}

/// Decides whether a statement may be executed.
///
/// # Errors
///
/// Returns [`SafetyViolation::GenerationFailed`] for the sentinel and
/// [`SafetyViolation::ForbiddenKeyword`] for the first denylisted keyword
/// found in the uppercased text.
pub fn check_statement(sql: &str) -> Result<(), SafetyViolation> {
    if sql == GeneratedSql::SENTINEL {
        return Err(SafetyViolation::GenerationFailed);
    }
    let uppercased = sql.to_uppercase();
    DENYLIST
        .iter()
        .copied()
        .find(|keyword| uppercased.contains(keyword))
        .map_or(Ok(()), |keyword| {
            Err(SafetyViolation::ForbiddenKeyword(keyword))
        })
}
