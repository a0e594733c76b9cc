//! Runs a job end to end: extract, map, sort, reduce, then commit.

use bytes::Bytes;
use tracing::{error, info};

use common::job::{Job, JobState};
use common::{JobError, KeyValue, Workload};

use crate::commit::{DirectoryCommitter, OutputCommitter};
use crate::engine;

/// Runs the workload registered under `job.workload`.
pub fn run_named(job: &mut Job) -> Result<Vec<KeyValue>, JobError> {
    match workload::try_named(&job.workload) {
        Some(engine) => run_job(job, &engine),
        None => {
            job.fail();
            Err(JobError::UnknownWorkload(job.workload.clone()))
        }
    }
}

/// Runs `engine` over `job.input` and commits the result to `job.output`.
pub fn run_job(job: &mut Job, engine: &Workload) -> Result<Vec<KeyValue>, JobError> {
    let mut committer = DirectoryCommitter::new(&job.output);
    run_job_with(job, engine, &mut committer)
}

/// Like [`run_job`], committing through `committer`.
///
/// The first error ends the run: the job is left in [`JobState::Failed`] and
/// the success marker is not written.
pub fn run_job_with<C: OutputCommitter>(
    job: &mut Job,
    engine: &Workload,
    committer: &mut C,
) -> Result<Vec<KeyValue>, JobError> {
    if job.state() != JobState::NotStarted {
        job.reset();
    }

    match execute(job, engine, committer) {
        Ok(result) => Ok(result),
        Err(e) => {
            error!("job over {} failed: {}", job.input.display(), e);
            job.fail();
            Err(e)
        }
    }
}

fn execute<C: OutputCommitter>(
    job: &mut Job,
    engine: &Workload,
    committer: &mut C,
) -> Result<Vec<KeyValue>, JobError> {
    let serialized_args =
        Bytes::from(serde_json::to_string(&job.args).map_err(anyhow::Error::from)?);

    job.advance();
    let records = engine::extract_records(&job.input)?;

    job.advance();
    let runs = engine::perform_map_parallel(records, engine, &serialized_args, job.workers)?;
    info!(
        "mapped {} pairs in {} runs",
        runs.iter().map(Vec::len).sum::<usize>(),
        runs.len()
    );

    job.advance();
    let sorted = engine::merge_sorted(runs);

    job.advance();
    let result = engine::perform_reduce(sorted, engine, &serialized_args)?;
    info!("reduced to {} keys", result.len());

    job.advance();
    committer.prepare()?;
    committer.write_partition(&result)?;
    committer.mark_success()?;

    job.advance();
    info!("committed job output to {}", job.output.display());
    Ok(result)
}
