//! JSONL record store: merged dataset, downsampled subsets, archived test set.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::logic::dataset::partition::downsample;
use crate::logic::dataset::record::SourceRecord;
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::storage;

/// File name of the archived evaluation set
pub const TEST_SET_FILE: &str = "test_set_final.jsonl";

/// Read every record from a JSONL file, validating the channel layout
pub fn read_records(path: &Path) -> PipelineResult<Vec<SourceRecord>> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut records = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: SourceRecord = serde_json::from_str(&line)?;
        record.features.validate().map_err(|e| {
            PipelineError::Schema(format!("{}:{}: {}", path.display(), line_no + 1, e))
        })?;
        records.push(record);
    }

    log::info!("Loaded {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Publish records as JSONL (one record per line)
pub fn write_records(path: &Path, records: &[SourceRecord]) -> PipelineResult<()> {
    let mut buf = Vec::with_capacity(records.len() * 512);
    for record in records {
        serde_json::to_writer(&mut buf, record)?;
        buf.push(b'\n');
    }
    storage::publish_atomic(path, &buf)?;
    log::info!("Wrote {} records to {:?}", records.len(), path);
    Ok(())
}

/// Path of the cached subset for a given per-class quota
pub fn subset_path(subsets_dir: &Path, quota: usize) -> PathBuf {
    subsets_dir.join(format!("TEP_subset_N{}.jsonl", quota))
}

/// Load the per-class downsampled subset, generating it from the merged
/// dataset on first use.
pub fn load_subset(merged: &Path, subsets_dir: &Path, quota: usize) -> PipelineResult<Vec<SourceRecord>> {
    let cached = subset_path(subsets_dir, quota);

    if cached.exists() {
        log::info!("Ingesting cached subset: {:?}", cached);
        return read_records(&cached);
    }

    log::info!("Generating fresh subset from merged dataset {:?}", merged);
    let records = read_records(merged)?;
    let subset = downsample(records, quota)?;
    write_records(&cached, &subset)?;
    Ok(subset)
}

/// Archive the evaluation partition (identity columns included)
pub fn save_test_set(processed_dir: &Path, records: &[SourceRecord]) -> PipelineResult<PathBuf> {
    let path = processed_dir.join(TEST_SET_FILE);
    write_records(&path, records)?;
    Ok(path)
}
