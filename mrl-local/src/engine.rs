//! The stages of a local MapReduce run: extract, map, shuffle-and-sort, reduce.
//!
//! Each stage takes its input by value and hands a fully built sequence to
//! the next one. Nothing is streamed between stages.

use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::Path;
use std::thread;

use bytes::Bytes;
use itertools::Itertools;
use tracing::{debug, info, warn};

use common::{JobError, KeyValue, Workload};

/// Reads every file of `input_dir` into `(source, line)` records.
///
/// Files are visited in directory-listing order and lines in file order.
/// Each record keeps its `\n` terminator; a final line without one is still
/// a record. Hidden entries and sub-directories are skipped.
pub fn extract_records(input_dir: &Path) -> Result<Vec<KeyValue>, JobError> {
    let entries =
        fs::read_dir(input_dir).map_err(|e| JobError::directory_access(input_dir, e))?;

    let mut records = Vec::new();
    let mut n_files = 0;
    for entry in entries {
        let entry = entry.map_err(|e| JobError::directory_access(input_dir, e))?;
        let path = entry.path();

        if entry.file_name().to_string_lossy().starts_with('.') {
            debug!("skipping hidden entry {}", path.display());
            continue;
        }
        let file_type = entry.file_type().map_err(|e| JobError::file_read(&path, e))?;
        if file_type.is_dir() {
            warn!("skipping sub-directory {}", path.display());
            continue;
        }

        let data = Bytes::from(fs::read(&path).map_err(|e| JobError::file_read(&path, e))?);
        let text = std::str::from_utf8(&data).map_err(|e| {
            JobError::file_read(&path, io::Error::new(io::ErrorKind::InvalidData, e))
        })?;

        let source = Bytes::from(path.to_string_lossy().into_owned());
        let before = records.len();
        for line in text.split_inclusive('\n') {
            records.push(KeyValue {
                key: source.clone(),
                value: data.slice_ref(line.as_bytes()),
            });
        }
        n_files += 1;
        debug!("read {} lines from {}", records.len() - before, path.display());
    }

    info!(
        "extracted {} records from {} files in {}",
        records.len(),
        n_files,
        input_dir.display()
    );
    Ok(records)
}

/// Applies the workload's map function to every record, keeping emission order.
pub fn perform_map(
    records: Vec<KeyValue>,
    engine: &Workload,
    serialized_args: &Bytes,
) -> Result<Vec<KeyValue>, JobError> {
    let map_func = engine.map_fn;
    let mut pairs = Vec::new();
    for record in records {
        for item in map_func(record, serialized_args.clone())? {
            pairs.push(item?);
        }
    }
    Ok(pairs)
}

/// Number of map threads actually used for `requested` workers over
/// `n_records` records.
///
/// Never more than the machine's available parallelism, never more than one
/// thread per record, and at least one.
pub fn effective_workers(requested: usize, n_records: usize) -> usize {
    let parallelism = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    requested.min(parallelism).min(n_records).max(1)
}

/// Maps contiguous chunks of records on up to `workers` threads.
///
/// Returns one run per chunk, each already shuffled and sorted, in chunk
/// order. Merging the runs with [`merge_sorted`] gives exactly what a
/// sequential [`perform_map`] followed by [`shuffle_sort`] gives.
pub fn perform_map_parallel(
    records: Vec<KeyValue>,
    engine: &Workload,
    serialized_args: &Bytes,
    workers: usize,
) -> Result<Vec<Vec<KeyValue>>, JobError> {
    let workers = effective_workers(workers, records.len());
    if workers == 1 {
        let pairs = perform_map(records, engine, serialized_args)?;
        return Ok(vec![shuffle_sort(pairs)]);
    }

    let chunk_len = records.len().div_ceil(workers);
    let chunks: Vec<Vec<KeyValue>> = records
        .into_iter()
        .chunks(chunk_len)
        .into_iter()
        .map(|chunk| chunk.collect())
        .collect();

    thread::scope(|s| {
        let handles: Vec<_> = chunks
            .into_iter()
            .enumerate()
            .map(|(worker, chunk)| {
                s.spawn(move || {
                    debug!(worker, "mapping {} records", chunk.len());
                    perform_map(chunk, engine, serialized_args).map(shuffle_sort)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    })
}

/// Orders pairs by key, comparing raw bytes.
///
/// The sort is stable: pairs with equal keys keep their emission order, so
/// reduce functions that are not commutative still see values in input order.
pub fn shuffle_sort(mut pairs: Vec<KeyValue>) -> Vec<KeyValue> {
    pairs.sort_by(|a, b| a.key.cmp(&b.key));
    pairs
}

/// Merges sorted runs into one sorted sequence.
///
/// Adjacent runs are merged pairwise until one is left. On equal keys the
/// pair from the earlier run wins, which keeps the merge stable with respect
/// to run order.
pub fn merge_sorted(mut runs: Vec<Vec<KeyValue>>) -> Vec<KeyValue> {
    while runs.len() > 1 {
        runs = runs
            .into_iter()
            .chunks(2)
            .into_iter()
            .map(|mut pair| {
                let left = pair.next().unwrap_or_default();
                match pair.next() {
                    Some(right) => left
                        .into_iter()
                        .merge_by(right, |a, b| a.key <= b.key)
                        .collect(),
                    None => left,
                }
            })
            .collect();
    }
    runs.pop().unwrap_or_default()
}

/// Folds each run of equal keys into one aggregated pair.
///
/// `sorted` must already be grouped by key. Non-contiguous duplicates are
/// reduced as separate groups.
pub fn perform_reduce(
    sorted: Vec<KeyValue>,
    engine: &Workload,
    serialized_args: &Bytes,
) -> Result<Vec<KeyValue>, JobError> {
    let reduce_func = engine.reduce_fn;
    let mut result = Vec::new();
    for (key, value_group) in &sorted.into_iter().chunk_by(KeyValue::key) {
        let iter = value_group.map(KeyValue::into_value);
        let value = reduce_func(key.clone(), Box::new(iter), serialized_args.clone())?;
        result.push(KeyValue { key, value });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn wc() -> Workload {
        workload::try_named("wc").unwrap()
    }

    fn pairs(keys: &[&str]) -> Vec<KeyValue> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| KeyValue::new(k.to_string(), i.to_string()))
            .collect()
    }

    /// Concatenates its values instead of summing them, so order is visible.
    fn concat(
        _key: Bytes,
        values: Box<dyn Iterator<Item = Bytes> + '_>,
        _aux: Bytes,
    ) -> anyhow::Result<Bytes> {
        let parts: Vec<String> = values
            .map(|v| String::from_utf8_lossy(&v).into_owned())
            .collect();
        Ok(Bytes::from(parts.join(",")))
    }

    #[test]
    fn extract_keeps_line_terminators_and_unterminated_tail() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "one\r\ntwo\nthree").unwrap();

        let records = extract_records(dir.path()).unwrap();
        let lines: Vec<_> = records.iter().map(KeyValue::value).collect();
        assert_eq!(lines, vec!["one\r\n", "two\n", "three"]);
        assert!(records[0].key.ends_with(b"a.txt"));
    }

    #[test]
    fn extract_skips_hidden_files_and_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".hidden"), "secret\n").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("b.txt"), "nested\n").unwrap();
        fs::write(dir.path().join("a.txt"), "visible\n").unwrap();

        let records = extract_records(dir.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, "visible\n");
    }

    #[test]
    fn extract_empty_file_yields_no_records() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("empty.txt"), "").unwrap();
        assert!(extract_records(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn extract_missing_directory_is_a_directory_error() {
        let dir = TempDir::new().unwrap();
        let err = extract_records(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, JobError::DirectoryAccess { .. }));
    }

    #[test]
    fn extract_malformed_utf8_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.txt"), b"ok\n\xc3\x28\n").unwrap();

        match extract_records(dir.path()).unwrap_err() {
            JobError::FileRead { path, source } => {
                assert!(path.ends_with("bad.txt"));
                assert_eq!(source.kind(), io::ErrorKind::InvalidData);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn shuffle_sort_orders_by_bytes_and_is_stable() {
        let sorted = shuffle_sort(pairs(&["b", "a", "B", "b", "a", "ä"]));
        let got: Vec<_> = sorted.iter().map(|kv| kv.to_string()).collect();
        assert_eq!(got, vec!["B\t2", "a\t1", "a\t4", "b\t0", "b\t3", "ä\t5"]);
    }

    #[test]
    fn merge_prefers_earlier_runs_on_ties() {
        let first = shuffle_sort(pairs(&["x", "a"]));
        let second = vec![KeyValue::new("a", "late"), KeyValue::new("z", "late")];
        let merged = merge_sorted(vec![first, second]);
        let got: Vec<_> = merged.iter().map(|kv| kv.to_string()).collect();
        assert_eq!(got, vec!["a\t1", "a\tlate", "x\t0", "z\tlate"]);
    }

    #[test]
    fn partitioned_map_matches_sequential() {
        let lines = [
            "the quick brown fox\n",
            "jumps over the lazy dog\n",
            "The Dog sleeps.\n",
            "\n",
            "quick, quick!\n",
        ];
        let records: Vec<_> = lines
            .iter()
            .map(|l| KeyValue::new("in/a.txt", l.to_string()))
            .collect();
        let aux = Bytes::new();

        let expected = shuffle_sort(perform_map(records.clone(), &wc(), &aux).unwrap());
        for workers in [0, 1, 2, 3, 8] {
            let runs = perform_map_parallel(records.clone(), &wc(), &aux, workers).unwrap();
            assert_eq!(merge_sorted(runs), expected, "workers = {workers}");
        }
    }

    #[test]
    fn merge_of_many_runs_keeps_run_order_on_ties() {
        let runs: Vec<Vec<KeyValue>> = (0..7)
            .map(|i| {
                shuffle_sort(vec![
                    KeyValue::new("b", format!("{i}")),
                    KeyValue::new("a", format!("{i}")),
                ])
            })
            .collect();
        let merged = merge_sorted(runs);
        let got: Vec<_> = merged.iter().map(|kv| kv.to_string()).collect();
        let expected: Vec<_> = (0..7)
            .map(|i| format!("a\t{i}"))
            .chain((0..7).map(|i| format!("b\t{i}")))
            .collect();
        assert_eq!(got, expected);
        assert!(merge_sorted(Vec::new()).is_empty());
    }

    #[test]
    fn workers_are_capped_by_parallelism_and_records() {
        let parallelism = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        assert_eq!(effective_workers(0, 100), 1);
        assert_eq!(effective_workers(20_000, 3), parallelism.min(3));
        assert_eq!(effective_workers(20_000, 50_000), parallelism);
        assert_eq!(effective_workers(4, 0), 1);
    }

    #[test]
    fn many_workers_over_thousands_of_records() {
        let records: Vec<_> = (0..5_000)
            .map(|i| KeyValue::new("in/a.txt", format!("w{} shared\n", i % 97)))
            .collect();
        let aux = Bytes::new();

        let expected = shuffle_sort(perform_map(records.clone(), &wc(), &aux).unwrap());
        let runs = perform_map_parallel(records, &wc(), &aux, 20_000).unwrap();
        assert!(runs.len() <= effective_workers(20_000, 5_000));
        assert_eq!(merge_sorted(runs), expected);
    }

    #[test]
    fn reduce_folds_contiguous_runs() {
        let engine = Workload {
            map_fn: workload::wc::map,
            reduce_fn: concat,
        };
        let sorted = shuffle_sort(pairs(&["b", "a", "b", "a"]));
        let result = perform_reduce(sorted, &engine, &Bytes::new()).unwrap();
        assert_eq!(
            result,
            vec![KeyValue::new("a", "1,3"), KeyValue::new("b", "0,2")]
        );
    }

    #[test]
    fn reduce_treats_split_runs_as_separate_groups() {
        let unsorted = vec![
            KeyValue::new("a", "1"),
            KeyValue::new("b", "1"),
            KeyValue::new("a", "1"),
        ];
        let result = perform_reduce(unsorted, &wc(), &Bytes::new()).unwrap();
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn reduce_of_nothing_is_empty() {
        assert!(perform_reduce(Vec::new(), &wc(), &Bytes::new())
            .unwrap()
            .is_empty());
    }
}
