//! Single-machine MapReduce.
//!
//! A job reads every file of an input directory line by line, maps each line
//! to key-value pairs, sorts the pairs by key, reduces each run of equal keys
//! and commits the result as `part-00000` plus a `_SUCCESS` marker.

pub mod commit;
pub mod driver;
pub mod engine;
pub mod fixtures;

pub use commit::{
    read_committed, DirectoryCommitter, OutputCommitter, PART_FILE, SUCCESS_MARKER,
};
pub use driver::{run_job, run_job_with, run_named};
