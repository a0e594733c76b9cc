//! Publishing a job's result in the Hadoop output layout.
//!
//! A committed output directory holds exactly two files: the single
//! partition `part-00000` and the zero-byte `_SUCCESS` marker. The marker is
//! written last; a directory without it never holds a valid result.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use common::{codec, JobError, KeyValue};

pub const PART_FILE: &str = "part-00000";
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// The three commit steps the job driver performs, in order.
///
/// The driver stops at the first error, so `mark_success` only runs after
/// `write_partition` returned `Ok`.
pub trait OutputCommitter {
    /// Creates the output location, or empties it if it already exists.
    fn prepare(&mut self) -> Result<(), JobError>;

    /// Writes the aggregate result, one `key<TAB>value` line per pair.
    fn write_partition(&mut self, result: &[KeyValue]) -> Result<(), JobError>;

    /// Writes the success marker.
    fn mark_success(&mut self) -> Result<(), JobError>;
}

/// Commits into a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectoryCommitter {
    dir: PathBuf,
}

impl DirectoryCommitter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl OutputCommitter for DirectoryCommitter {
    fn prepare(&mut self) -> Result<(), JobError> {
        match fs::metadata(&self.dir) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("creating output directory {}", self.dir.display());
                fs::create_dir_all(&self.dir)
                    .map_err(|e| JobError::directory_access(&self.dir, e))
            }
            Err(e) => Err(JobError::directory_access(&self.dir, e)),
            Ok(meta) if !meta.is_dir() => Err(JobError::directory_access(
                &self.dir,
                io::Error::other("not a directory"),
            )),
            Ok(_) => purge(&self.dir),
        }
    }

    fn write_partition(&mut self, result: &[KeyValue]) -> Result<(), JobError> {
        let path = self.dir.join(PART_FILE);
        let file = File::create(&path).map_err(|e| JobError::file_write(&path, e))?;

        let mut writer = BufWriter::new(file);
        for kv in result {
            writer
                .write_all(&codec::encode(kv))
                .map_err(|e| JobError::file_write(&path, e))?;
        }
        writer.flush().map_err(|e| JobError::file_write(&path, e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| JobError::file_write(&path, e))?;

        info!("wrote {} records to {}", result.len(), path.display());
        Ok(())
    }

    fn mark_success(&mut self) -> Result<(), JobError> {
        let path = self.dir.join(SUCCESS_MARKER);
        let file = File::create(&path).map_err(|e| JobError::file_write(&path, e))?;
        file.sync_all().map_err(|e| JobError::file_write(&path, e))?;
        debug!("wrote success marker {}", path.display());
        Ok(())
    }
}

/// Removes everything inside `dir`, leaving `dir` itself in place.
fn purge(dir: &Path) -> Result<(), JobError> {
    let entries = fs::read_dir(dir).map_err(|e| JobError::directory_access(dir, e))?;
    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| JobError::directory_access(dir, e))?;
        let path = entry.path();
        let is_dir = entry
            .file_type()
            .map_err(|e| JobError::directory_access(&path, e))?
            .is_dir();
        let removal = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removal.map_err(|e| JobError::directory_access(&path, e))?;
        removed += 1;
    }
    debug!("purged {} entries from {}", removed, dir.display());
    Ok(())
}

/// Whether `dir` holds a committed result.
pub fn is_committed(dir: &Path) -> bool {
    dir.join(SUCCESS_MARKER).is_file()
}

/// Reads back a committed result.
///
/// Fails with [`JobError::Uncommitted`] when the success marker is missing,
/// even if a partition file is present.
pub fn read_committed(dir: &Path) -> Result<Vec<KeyValue>, JobError> {
    if !is_committed(dir) {
        return Err(JobError::Uncommitted {
            path: dir.to_path_buf(),
        });
    }

    let path = dir.join(PART_FILE);
    let file = File::open(&path).map_err(|e| JobError::file_read(&path, e))?;
    let mut result = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| JobError::file_read(&path, e))?;
        result.push(codec::decode(&line)?);
    }
    Ok(result)
}
