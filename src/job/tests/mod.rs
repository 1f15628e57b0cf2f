//! Service orchestration tests for the job pipeline.
