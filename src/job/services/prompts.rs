//! Prompt templates sent to the language model.

use crate::job::domain::{ColumnSchema, GeneratedSql, ResultRow, SchemaDescriptor, UserQuestion};
use minijinja::{Environment, context};
use serde::Serialize;
use thiserror::Error;

const SQL_GENERATION_TEMPLATE: &str = r#"/* The schema of a PostgreSQL database is provided below. */

{% for table in tables %}
Table: {{ table.name }}
Columns:
{% for column in table.columns %}
- {{ column.name }} ({{ column.data_type }})
{% endfor %}

{% endfor %}
Your task is to be an expert PostgreSQL generator.
Given the database schema and a user question, generate a single, valid PostgreSQL query.
- You MUST NOT use 'SELECT *'. Instead, you must explicitly select only the columns that are most relevant to the user's question.
- Ensure you use PostgreSQL syntax, for example, use 'LIMIT N' instead of 'SELECT TOP(N)'.
- Only output the raw SQL query, with no other text or markdown formatting.

Question: "{{ question }}"
SQL Query:"#;

const EXPLANATION_TEMPLATE: &str =
    "Explain the following SQL query in one simple, human-readable sentence: {{ sql }}";

const SUMMARY_TEMPLATE: &str = r#"Based on the user's question and the following JSON data, write a one-sentence summary of the answer.

Original Question: "{{ question }}"
JSON Result: {{ results }}

Summary:"#;

/// Prompt rendering failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("prompt rendering failed: {0}")]
pub struct PromptError(String);

#[derive(Serialize)]
struct TableContext<'a> {
    name: &'a str,
    columns: &'a [ColumnSchema],
}

fn render(template: &str, ctx: minijinja::Value) -> Result<String, PromptError> {
    let mut environment = Environment::new();
    environment.set_trim_blocks(true);
    environment
        .render_str(template, ctx)
        .map_err(|error| PromptError(error.to_string()))
}

/// Renders the SQL generation prompt for a question against a schema.
///
/// # Errors
///
/// Returns [`PromptError`] when template rendering fails.
pub fn sql_generation_prompt(
    schema: &SchemaDescriptor,
    question: &UserQuestion,
) -> Result<String, PromptError> {
    let tables: Vec<TableContext<'_>> = schema
        .tables()
        .map(|(name, columns)| TableContext { name, columns })
        .collect();
    render(
        SQL_GENERATION_TEMPLATE,
        context! { tables => tables, question => question.as_str() },
    )
}

/// Renders the one-sentence explanation prompt for a generated statement.
///
/// # Errors
///
/// Returns [`PromptError`] when template rendering fails.
pub fn explanation_prompt(sql: &GeneratedSql) -> Result<String, PromptError> {
    render(EXPLANATION_TEMPLATE, context! { sql => sql.as_str() })
}

/// Renders the result summary prompt.
///
/// # Errors
///
/// Returns [`PromptError`] when the rows cannot be serialized or rendering
/// fails.
pub fn summary_prompt(question: &UserQuestion, results: &[ResultRow]) -> Result<String, PromptError> {
    let serialized =
        serde_json::to_string(results).map_err(|error| PromptError(error.to_string()))?;
    render(
        SUMMARY_TEMPLATE,
        context! { question => question.as_str(), results => serialized },
    )
}
