use crate::models::Snapshot;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot io error on {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("snapshot {path} is not valid: {source}")]
    Decode { path: PathBuf, source: serde_json::Error },
    #[error("failed to encode snapshot: {0}")]
    Encode(serde_json::Error),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io { path: path.to_path_buf(), source }
}

pub fn load(path: impl AsRef<Path>) -> Result<Snapshot, StoreError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(io_err(path))?;
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode { path: path.to_path_buf(), source })
}

/// Previous run's snapshot, or an empty one when it is missing or unreadable.
pub fn load_or_empty(path: impl AsRef<Path>) -> Snapshot {
    match load(path) {
        Ok(snap) => snap,
        Err(e) => {
            warn!(error = %e, "no usable previous snapshot, starting fresh");
            Snapshot::empty()
        }
    }
}

/// Write `snapshot` to `path`. The document lands in a sibling temp file first
/// and is renamed into place, so readers never see a partial write.
pub fn save(path: impl AsRef<Path>, snapshot: &Snapshot, pretty: bool) -> Result<(), StoreError> {
    let path = path.as_ref();
    let bytes = (if pretty { serde_json::to_vec_pretty(snapshot) } else { serde_json::to_vec(snapshot) })
        .map_err(StoreError::Encode)?;

    let tmp = temp_path(path);
    {
        let mut f = fs::File::create(&tmp).map_err(io_err(&tmp))?;
        f.write_all(&bytes).map_err(io_err(&tmp))?;
        f.sync_all().map_err(io_err(&tmp))?;
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(path)(e));
    }
    debug!(path = %path.display(), bytes = bytes.len(), "snapshot written");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
