//! Per-run scratch context.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Directory name of the tile workspace inside a run directory.
const TILES_DIR: &str = "tiles";
/// File name of the composite inside a run directory.
const OUTPUT_FILE: &str = "output.jpg";
/// Marker left in a run directory kept after a failure. Holds the error text.
const FAILED_MARKER: &str = "FAILED";

/// Scratch area and cancellation handle owned by exactly one pipeline run.
///
/// Every run gets its own directory under the configured root, so
/// overlapping runs never share tiles or an output slot.
///
/// ```text
/// <root>/<run_id>/
///   tiles/image0000.jpg ...
///   output.jpg
///   FAILED          (only on retained failures)
/// ```
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: Uuid,
    run_dir: PathBuf,
    cancel: CancellationToken,
}

impl RunContext {
    /// Allocates a fresh run under `root`. Nothing is created on disk yet.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let run_id = Uuid::new_v4();
        Self {
            run_id,
            run_dir: root.as_ref().join(run_id.to_string()),
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the run's cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Directory the tiles are downloaded into.
    pub fn workspace(&self) -> PathBuf {
        self.run_dir.join(TILES_DIR)
    }

    /// Path the composite is written to.
    pub fn output_path(&self) -> PathBuf {
        self.run_dir.join(OUTPUT_FILE)
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Clears the workspace if it exists, otherwise creates it.
    pub async fn prepare(&self) -> io::Result<()> {
        let workspace = self.workspace();
        match tokio::fs::remove_dir_all(&workspace).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        tokio::fs::create_dir_all(&workspace).await
    }

    /// Marks the run directory as a retained failure, recording `reason`.
    ///
    /// Only marked directories are considered by [`prune_failed_runs`].
    /// Fails with `NotFound` when the run never got as far as creating its
    /// directory.
    pub async fn mark_failed(&self, reason: &str) -> io::Result<()> {
        tokio::fs::write(self.run_dir.join(FAILED_MARKER), reason).await
    }

    /// Removes the whole run directory. Missing directories are not an error.
    pub async fn cleanup(&self) -> io::Result<()> {
        match tokio::fs::remove_dir_all(&self.run_dir).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Run directories directly under `root`, paired with their failure marker
/// modification time (`None` when unmarked).
async fn list_run_dirs(root: &Path) -> io::Result<Vec<(PathBuf, Option<SystemTime>)>> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let marked = tokio::fs::metadata(entry.path().join(FAILED_MARKER))
            .await
            .ok()
            .map(|meta| meta.modified().unwrap_or(SystemTime::UNIX_EPOCH));
        dirs.push((entry.path(), marked));
    }
    Ok(dirs)
}

async fn remove_dir(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Keeps the `keep` most recent retained failures under `root` and removes
/// the older ones. Directories of in-flight runs carry no marker and are
/// never touched. Returns the number of directories removed.
pub async fn prune_failed_runs(root: &Path, keep: usize) -> io::Result<usize> {
    let mut failed: Vec<(PathBuf, SystemTime)> = list_run_dirs(root)
        .await?
        .into_iter()
        .filter_map(|(path, marked)| marked.map(|at| (path, at)))
        .collect();

    // Newest first; ties broken by name so the order is stable.
    failed.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    let mut removed = 0;
    for (path, _) in failed.into_iter().skip(keep) {
        remove_dir(&path).await?;
        removed += 1;
    }
    Ok(removed)
}

/// Removes every unmarked run directory under `root`.
///
/// These belong to runs interrupted by a crash or restart. Only call this
/// while no run is in flight.
pub async fn sweep_abandoned_runs(root: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for (path, marked) in list_run_dirs(root).await? {
        if marked.is_none() {
            remove_dir(&path).await?;
            removed += 1;
        }
    }
    Ok(removed)
}
