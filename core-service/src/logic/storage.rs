//! Artifact storage - atomic publish for every cached file
//!
//! Writers stage content in a sibling temp file and rename it into place.
//! An interrupted write leaves only a `.tmp-*` file, never a truncated
//! artifact that an existence check would accept.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::logic::error::{PipelineError, PipelineResult};

/// Write `bytes` to `path` atomically
pub fn publish_atomic(path: &Path, bytes: &[u8]) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = staging_path(path);
    let result = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    log::debug!("Published {:?} ({} bytes)", path, bytes.len());
    Ok(())
}

/// Serialize `value` as pretty JSON and publish it atomically
pub fn publish_json<T: Serialize>(path: &Path, value: &T) -> PipelineResult<()> {
    let json = serde_json::to_vec_pretty(value)?;
    publish_atomic(path, &json)
}

/// Load JSON from `path`, mapping absence to `NotFound`
pub fn load_json<T: DeserializeOwned>(path: &Path) -> PipelineResult<T> {
    let data = read_existing(path)?;
    Ok(serde_json::from_slice(&data)?)
}

/// Read a file, mapping absence to `NotFound`
pub fn read_existing(path: &Path) -> PipelineResult<Vec<u8>> {
    match fs::read(path) {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PipelineError::NotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    path.with_file_name(format!(".{}.tmp-{}", name, uuid::Uuid::new_v4().simple()))
}
