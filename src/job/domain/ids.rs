//! Identifier and validated scalar types for the job domain.

use super::JobDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque token that threads one user request through every pipeline stage.
///
/// Minted at intake as a random UUID, but parsed from pipeline messages as an
/// arbitrary non-blank string so foreign producers can participate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Mints a fresh, random correlation identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parses a correlation identifier received from a message or request.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::EmptyCorrelationId`] when the value is blank.
    pub fn parse(value: impl Into<String>) -> Result<Self, JobDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(JobDomainError::EmptyCorrelationId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<String> for CorrelationId {
    type Error = JobDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CorrelationId> for String {
    fn from(value: CorrelationId) -> Self {
        value.0
    }
}

impl AsRef<str> for CorrelationId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Natural-language question submitted by a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserQuestion(String);

impl UserQuestion {
    /// Creates a validated question.
    ///
    /// The text is kept verbatim; only blank input is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::EmptyQuestion`] when the value is empty or
    /// whitespace-only.
    pub fn new(value: impl Into<String>) -> Result<Self, JobDomainError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(JobDomainError::EmptyQuestion);
        }
        Ok(Self(raw))
    }

    /// Returns the question text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserQuestion {
    type Error = JobDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserQuestion> for String {
    fn from(value: UserQuestion) -> Self {
        value.0
    }
}

impl AsRef<str> for UserQuestion {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
