//! Generated SQL text and the normalisation applied to model output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fence marker the language model sometimes wraps around its output.
const CODE_FENCE: &str = "```";

/// Language tags that may follow an opening code fence.
const FENCE_LANGUAGE_TAGS: [&str; 5] = ["postgresql", "postgres", "pgsql", "psql", "sql"];

/// SQL statement text produced by the generation stage.
///
/// The literal value [`GeneratedSql::SENTINEL`] marks a generation failure and
/// is carried downstream so the pipeline still reaches a terminal record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratedSql(String);

impl GeneratedSql {
    /// Sentinel value signalling that generation failed.
    pub const SENTINEL: &'static str = "ERROR";

    /// Wraps statement text verbatim.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Builds a statement from raw model output, removing markdown code
    /// fences and surrounding whitespace.
    #[must_use]
    pub fn from_model_output(raw: &str) -> Self {
        Self(strip_code_fences(raw).trim().to_owned())
    }

    /// Returns the generation-failure sentinel.
    #[must_use]
    pub fn sentinel() -> Self {
        Self(Self::SENTINEL.to_owned())
    }

    /// Returns `true` when this value is the generation-failure sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.0 == Self::SENTINEL
    }

    /// Returns the statement text exactly as generated.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the statement with surrounding whitespace removed, ready to be
    /// embedded in a subquery.
    ///
    /// A statement terminator is dropped together with any line comments
    /// that follow it. A `;` inside a string literal is kept.
    #[must_use]
    pub fn executable_text(&self) -> &str {
        let trimmed = self.0.trim();
        trimmed
            .char_indices()
            .filter(|&(_, ch)| ch == ';')
            .find_map(|(position, _)| {
                let (statement, terminator_and_tail) = trimmed.split_at(position);
                let tail = terminator_and_tail.get(1..).unwrap_or_default();
                (!inside_literal(statement) && only_line_comments(tail))
                    .then(|| statement.trim_end())
            })
            .unwrap_or(trimmed)
    }
}

impl AsRef<str> for GeneratedSql {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for GeneratedSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn inside_literal(prefix: &str) -> bool {
    prefix.chars().filter(|&ch| ch == '\'').fold(false, |open, _| !open)
}

fn only_line_comments(text: &str) -> bool {
    text.lines().all(|line| {
        let content = line.trim();
        content.is_empty() || content.starts_with("--")
    })
}

/// Removes every markdown code-fence marker, together with a SQL language tag
/// directly following it.
fn strip_code_fences(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());
    let mut remaining = raw;
    while let Some(position) = remaining.find(CODE_FENCE) {
        let (before, rest) = remaining.split_at(position);
        output.push_str(before);
        let after_fence = rest.get(CODE_FENCE.len()..).unwrap_or_default();
        remaining = strip_language_tag(after_fence);
    }
    output.push_str(remaining);
    output
}

fn strip_language_tag(text: &str) -> &str {
    FENCE_LANGUAGE_TAGS
        .iter()
        .find_map(|tag| {
            let candidate = text.get(..tag.len())?;
            if !candidate.eq_ignore_ascii_case(tag) {
                return None;
            }
            let rest = text.get(tag.len()..)?;
            let ends_tag = rest
                .chars()
                .next()
                .is_none_or(|ch| !ch.is_ascii_alphanumeric() && ch != '_');
            ends_tag.then_some(rest)
        })
        .unwrap_or(text)
}
