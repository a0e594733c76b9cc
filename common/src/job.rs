use std::fmt;
use std::path::PathBuf;

use tracing::{error, info};

/// Lifecycle of a single job run.
///
/// A run moves forward one stage at a time and ends in either
/// [`JobState::Committed`] or [`JobState::Failed`]. Only `Committed`, which is
/// reached once the success marker exists, counts as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    NotStarted,
    Extracting,
    Mapping,
    Sorting,
    Reducing,
    Writing,
    Committed,
    Failed,
}

impl JobState {
    /// The stage that follows this one on the success path.
    pub fn next(self) -> Option<JobState> {
        use JobState::*;
        match self {
            NotStarted => Some(Extracting),
            Extracting => Some(Mapping),
            Mapping => Some(Sorting),
            Sorting => Some(Reducing),
            Reducing => Some(Writing),
            Writing => Some(Committed),
            Committed | Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Committed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::NotStarted => "not started",
            JobState::Extracting => "extracting",
            JobState::Mapping => "mapping",
            JobState::Sorting => "sorting",
            JobState::Reducing => "reducing",
            JobState::Writing => "writing",
            JobState::Committed => "committed",
            JobState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A job submitted to the local engine, together with the state of its run.
#[derive(Debug)]
pub struct Job {
    /// Directory whose files are read as input.
    pub input: PathBuf,

    /// Directory that receives `part-00000` and `_SUCCESS`.
    pub output: PathBuf,

    /// Name of the workload to run.
    pub workload: String,

    /// Auxiliary arguments handed to the map and reduce functions.
    pub args: Vec<String>,

    /// Number of map threads. Zero behaves like one.
    pub workers: usize,

    state: JobState,
}

impl Job {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, workload: &str) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            workload: workload.to_string(),
            args: Vec::new(),
            workers: 1,
            state: JobState::NotStarted,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Moves the run to its next stage and returns the new state.
    ///
    /// Terminal states are sticky.
    pub fn advance(&mut self) -> JobState {
        if let Some(next) = self.state.next() {
            info!(job = %self.workload, "job {} -> {}", self.state, next);
            self.state = next;
        }
        self.state
    }

    /// Marks the run as failed unless it already committed.
    pub fn fail(&mut self) {
        if self.state != JobState::Committed {
            error!(job = %self.workload, "job failed while {}", self.state);
            self.state = JobState::Failed;
        }
    }

    /// Puts a finished job back to `NotStarted` so it can be run again.
    pub fn reset(&mut self) {
        self.state = JobState::NotStarted;
    }
}
