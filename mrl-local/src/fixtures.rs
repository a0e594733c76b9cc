//! Test-data helpers for benchmarking runs.
//!
//! These prepare an input directory before a job; they are not part of the
//! job itself.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::glob;
use tracing::{debug, info};

use common::JobError;

fn entries_of(dir: &Path) -> Result<Vec<PathBuf>, JobError> {
    let pattern = format!("{}/*", glob::Pattern::escape(&dir.to_string_lossy()));
    let paths = glob(&pattern).map_err(|e| {
        JobError::directory_access(dir, io::Error::new(io::ErrorKind::InvalidInput, e))
    })?;

    paths
        .map(|entry| entry.map_err(|e| JobError::directory_access(dir, e.into_error())))
        .collect()
}

/// Creates `dir` if needed, otherwise removes every file in it.
pub fn clear_input_directory(dir: &Path) -> Result<(), JobError> {
    if !dir.exists() {
        return fs::create_dir_all(dir).map_err(|e| JobError::directory_access(dir, e));
    }

    for path in entries_of(dir)? {
        let removal = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removal.map_err(|e| JobError::directory_access(&path, e))?;
    }
    debug!("cleared {}", dir.display());
    Ok(())
}

/// Writes `n` copies of every file in `raw_dir` into `input_dir`.
///
/// The copy `i` of `book.txt` is named `book_i.txt`. Returns the number of
/// files written.
pub fn generate_file_copies(
    n: usize,
    input_dir: &Path,
    raw_dir: &Path,
) -> Result<usize, JobError> {
    let mut written = 0;
    for source in entries_of(raw_dir)? {
        if source.is_dir() {
            continue;
        }
        let text = fs::read_to_string(&source).map_err(|e| JobError::file_read(&source, e))?;
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        for i in 0..n {
            let target = input_dir.join(format!("{stem}_{i}.txt"));
            fs::write(&target, &text).map_err(|e| JobError::file_write(&target, e))?;
            written += 1;
        }
    }
    info!("generated {} input files in {}", written, input_dir.display());
    Ok(written)
}
