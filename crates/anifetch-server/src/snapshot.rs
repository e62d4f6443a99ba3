//! Flat-file snapshot store.
//!
//! Snapshots are append-only: every write creates a new file and existing
//! files are never touched. Retention is left to whoever owns the directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anifetch_core::{Snapshot, Success, TaskKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SnapshotError;

/// Listing entry for one snapshot file.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotInfo {
    pub name: String,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

/// Reads and writes snapshot files under one directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Persist `success` as a new snapshot file and return its path.
    ///
    /// The directory is created on first write.
    pub async fn write(&self, kind: TaskKind, success: &Success) -> Result<PathBuf, SnapshotError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let token = Uuid::new_v4().simple().to_string();
        let name = Snapshot::file_name(kind, Utc::now(), &token[..8]);
        let path = self.dir.join(&name);

        let body = serde_json::to_vec_pretty(&Snapshot::from_success(success))?;
        write_new(&path, &body).await?;

        info!(path = %path.display(), items = success.items.len(), "Snapshot written");
        Ok(path)
    }

    /// Snapshot files, newest first.
    pub async fn list(&self) -> Result<Vec<SnapshotInfo>, SnapshotError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut snapshots = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if validate_name(&name).is_err() {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            snapshots.push(SnapshotInfo {
                name,
                size_bytes: metadata.len(),
                modified: metadata.modified().map(DateTime::<Utc>::from)?,
            });
        }

        snapshots.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));
        debug!(dir = %self.dir.display(), count = snapshots.len(), "Listed snapshots");
        Ok(snapshots)
    }

    /// Read one snapshot by file name.
    pub async fn read(&self, name: &str) -> Result<Snapshot, SnapshotError> {
        validate_name(name)?;
        let bytes = match tokio::fs::read(self.dir.join(name)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SnapshotError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Write `body` to a hidden temp file, then link it into place at `path`.
///
/// Fails if `path` already exists. Nothing is left at `path` when any step
/// fails, and the temp file is always removed.
async fn write_new(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let tmp = temp_path(path);
    let result = write_and_link(&tmp, path, body).await;
    if let Err(e) = tokio::fs::remove_file(&tmp).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %tmp.display(), error = %e, "Failed to remove temp snapshot");
        }
    }
    result
}

async fn write_and_link(tmp: &Path, path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(tmp)
        .await?;
    file.write_all(body).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::hard_link(tmp, path).await
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Accept only plain `*.json` file names inside the snapshot directory.
pub fn validate_name(name: &str) -> Result<(), SnapshotError> {
    let stem_ok = name
        .strip_suffix(".json")
        .is_some_and(|stem| !stem.is_empty());
    let chars_ok = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if !stem_ok || !chars_ok || name.starts_with('.') || name.contains("..") {
        return Err(SnapshotError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anifetch_core::CanonicalItem;

    fn success() -> Success {
        Success {
            items: vec![
                CanonicalItem::new("牧神记")
                    .with_detail_url("http://www.iyinghua.com/show/6389.html")
                    .with_current_episode(8),
                CanonicalItem::new("魔天记"),
            ],
            source_url: "http://www.iyinghua.com".to_string(),
            timestamp: Utc::now(),
            title: None,
        }
    }

    #[tokio::test]
    async fn test_write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested"));
        let success = success();

        let path = store.write(TaskKind::Latest, &success).await.unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("latest_updates_"));

        let snapshot = store.read(name).await.unwrap();
        assert!(snapshot.matches(&success));
        assert_eq!(snapshot.total_count, 2);
    }

    #[tokio::test]
    async fn test_concurrent_writes_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let success = success();

        let (a, b) = tokio::join!(
            store.write(TaskKind::Search, &success),
            store.write(TaskKind::Search, &success)
        );
        assert_ne!(a.unwrap(), b.unwrap());
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_nothing_listed() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let path = store.write(TaskKind::Latest, &success()).await.unwrap();
        let original = std::fs::read(&path).unwrap();

        assert!(write_new(&path, b"{\"data\": [").await.is_err());

        assert_eq!(std::fs::read(&path).unwrap(), original);
        assert!(!temp_path(&path).exists());
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_temp_files_are_never_listed() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let path = dir.path().join("latest_updates_2025-07-01_1_a1b2c3d4.json");
        std::fs::write(temp_path(&path), "{\"data\": [").unwrap();

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("absent"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let store = SnapshotStore::new(dir.path());
        store.write(TaskKind::Latest, &success()).await.unwrap();

        let names: Vec<_> = store.list().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".json"));
    }

    #[tokio::test]
    async fn test_read_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        assert!(matches!(
            store.read("missing.json").await,
            Err(SnapshotError::NotFound(_))
        ));
        assert!(matches!(
            store.read("../etc/passwd.json").await,
            Err(SnapshotError::InvalidName(_))
        ));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("latest_updates_2025-07-01_1751358600000_a1b2c3d4.json").is_ok());
        assert!(validate_name(".json").is_err());
        assert!(validate_name("a/b.json").is_err());
        assert!(validate_name("snapshot.txt").is_err());
        assert!(validate_name("..json").is_err());
    }
}
