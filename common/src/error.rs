//! Error kinds surfaced by a local MapReduce job.
//!
//! Every variant that touches the filesystem carries the offending path and
//! the underlying [`io::Error`], so a failed run can be diagnosed from the
//! message alone.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    /// The input or output directory is missing, unreadable or unwritable.
    #[error("cannot access directory `{}`: {source}", path.display())]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An input file could not be opened, read or decoded as UTF-8.
    #[error("cannot read input file `{}`: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The partition file or the success marker could not be written.
    #[error("cannot write `{}`: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An output directory was consumed without a success marker.
    #[error("output directory `{}` has no success marker", path.display())]
    Uncommitted { path: PathBuf },

    #[error("the workload `{0}` is not a known workload")]
    UnknownWorkload(String),

    /// A map or reduce function returned an error.
    #[error(transparent)]
    Application(#[from] anyhow::Error),
}

impl JobError {
    pub fn directory_access(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::DirectoryAccess {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn file_read(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::FileRead {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn file_write(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::FileWrite {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_path() {
        let err = JobError::file_read(
            "files/input/a.txt",
            io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8"),
        );
        let msg = err.to_string();
        assert!(msg.contains("files/input/a.txt"));
        assert!(msg.contains("valid UTF-8"));
        assert!(matches!(err, JobError::FileRead { .. }));
    }

    #[test]
    fn application_errors_are_transparent() {
        let err = JobError::from(anyhow::anyhow!("bad count"));
        assert_eq!(err.to_string(), "bad count");
        assert!(matches!(err, JobError::Application(_)));
    }
}
