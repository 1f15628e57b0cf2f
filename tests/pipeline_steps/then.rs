//! Then steps for query pipeline BDD scenarios.

use super::world::{PipelineWorld, run_async};
use datalab::job::{
    domain::{JobStatus, safety::SafetyViolation},
    ports::SessionStore,
};
use rstest_bdd_macros::then;
use std::sync::atomic::Ordering;

#[then("the submission is accepted")]
fn submission_accepted(world: &PipelineWorld) -> Result<(), eyre::Report> {
    match world.last_status {
        Some(202) => Ok(()),
        other => Err(eyre::eyre!("expected 202, got {other:?}")),
    }
}

#[then("the submission is rejected with status {code:u16}")]
fn submission_rejected(world: &PipelineWorld, code: u16) -> Result<(), eyre::Report> {
    if world.last_status != Some(code) {
        return Err(eyre::eyre!("expected {code}, got {:?}", world.last_status));
    }
    if world.last_correlation_id.is_some() {
        return Err(eyre::eyre!("rejected submission returned a correlation id"));
    }
    Ok(())
}

#[then(r#"the terminal record status is "{status}""#)]
fn terminal_status_is(world: &PipelineWorld, status: String) -> Result<(), eyre::Report> {
    let expected = JobStatus::try_from(status.as_str())?;
    let record = world.terminal_record()?;
    if record.status() != expected {
        return Err(eyre::eyre!(
            "expected {}, found {} (error: {:?})",
            expected.as_str(),
            record.status().as_str(),
            record.error()
        ));
    }
    Ok(())
}

#[then("the terminal record has at most {limit:usize} results")]
fn at_most_results(world: &PipelineWorld, limit: usize) -> Result<(), eyre::Report> {
    let count = world.terminal_record()?.results().len();
    if count > limit {
        return Err(eyre::eyre!("expected at most {limit} rows, found {count}"));
    }
    Ok(())
}

#[then("the terminal record has no results")]
fn no_results(world: &PipelineWorld) -> Result<(), eyre::Report> {
    let record = world.terminal_record()?;
    if !record.results().is_empty() || !record.result_summary().is_empty() {
        return Err(eyre::eyre!("failed record carries results: {record:?}"));
    }
    Ok(())
}

#[then("the terminal record has a non-empty summary")]
fn non_empty_summary(world: &PipelineWorld) -> Result<(), eyre::Report> {
    if world.terminal_record()?.result_summary().trim().is_empty() {
        return Err(eyre::eyre!("summary is empty"));
    }
    Ok(())
}

#[then("the terminal record preserves the submitted question")]
fn preserves_question(world: &PipelineWorld) -> Result<(), eyre::Report> {
    let record = world.terminal_record()?;
    let submitted = world
        .submitted_question
        .as_deref()
        .ok_or_else(|| eyre::eyre!("no question submitted"))?;
    if record.user_question().as_str() != submitted {
        return Err(eyre::eyre!(
            "question changed in transit: {:?}",
            record.user_question()
        ));
    }
    Ok(())
}

#[then("the terminal record reports a generation failure")]
fn reports_generation_failure(world: &PipelineWorld) -> Result<(), eyre::Report> {
    let record = world.terminal_record()?;
    let expected = SafetyViolation::GenerationFailed.to_string();
    if !record.generated_sql().is_sentinel() || record.error() != Some(expected.as_str()) {
        return Err(eyre::eyre!("expected sentinel failure, found {record:?}"));
    }
    Ok(())
}

#[then("the query executor was never invoked")]
fn executor_never_invoked(world: &PipelineWorld) -> Result<(), eyre::Report> {
    let calls = world.executor.calls.load(Ordering::SeqCst);
    if calls != 0 {
        return Err(eyre::eyre!("executor was invoked {calls} times"));
    }
    Ok(())
}

#[then("no generation job was queued")]
fn no_generation_job(world: &PipelineWorld) -> Result<(), eyre::Report> {
    if !world.generation_queue.pending()?.is_empty() {
        return Err(eyre::eyre!("a generation job was queued"));
    }
    Ok(())
}

#[then("no terminal record was written")]
fn no_terminal_record(world: &PipelineWorld) -> Result<(), eyre::Report> {
    let records = run_async(world.store.list_recent())?;
    if !records.is_empty() {
        return Err(eyre::eyre!("unexpected records: {records:?}"));
    }
    Ok(())
}
