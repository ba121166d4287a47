//! Filesystem artifact store.
//!
//! Layout under the root directory:
//!
//! ```text
//! current/solution.rs            live slot
//! runs/<run>/run.json            run manifest (accepted count, timestamps)
//! runs/<run>/gen_<n>.rs          accepted source, never overwritten
//! runs/<run>/gen_<n>.meta.json   GenerationRecord
//! resets/before_reset_<ts>.rs    live slot saved by a reset
//! ```

use super::{ArtifactStore, GenerationRecord, Result, StorageError};
use quine_core::{RunId, ORIGIN_SOURCE};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// File-based artifact store, writing into one run's log.
pub struct FsArtifactStore {
    root: PathBuf,
    run_id: RunId,
}

impl FsArtifactStore {
    /// Open the store under `root` for a new run.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        Self::for_run(root, RunId::new()).await
    }

    /// Open the store under `root` for a specific run.
    pub async fn for_run(root: impl AsRef<Path>, run_id: RunId) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("current")).await?;
        fs::create_dir_all(root.join("runs")).await?;
        fs::create_dir_all(root.join("resets")).await?;

        Ok(Self { root, run_id })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the live slot.
    pub fn live_path(&self) -> PathBuf {
        self.root.join("current").join("solution.rs")
    }

    fn run_dir(&self, run_id: RunId) -> PathBuf {
        self.root.join("runs").join(run_id.to_string())
    }

    fn generation_path(&self, run_id: RunId, generation: u32) -> PathBuf {
        self.run_dir(run_id).join(format!("gen_{}.rs", generation))
    }

    fn record_path(&self, run_id: RunId, generation: u32) -> PathBuf {
        self.run_dir(run_id).join(format!("gen_{}.meta.json", generation))
    }

    fn manifest_path(&self, run_id: RunId) -> PathBuf {
        self.run_dir(run_id).join("run.json")
    }

    /// Bump the run manifest's accepted count and return it.
    async fn bump_manifest(&self) -> Result<u64> {
        let path = self.manifest_path(self.run_id);
        let mut accepted = 0u64;
        let mut started_at = chrono::Utc::now();
        if let Some(json) = read_json::<serde_json::Value>(&path).await? {
            if let Some(v) = json.get("accepted").and_then(|v| v.as_u64()) {
                accepted = v;
            }
            if let Some(t) = json.get("started_at").and_then(|v| serde_json::from_value(v.clone()).ok()) {
                started_at = t;
            }
        }
        accepted += 1;
        let manifest = serde_json::json!({
            "run_id": self.run_id,
            "started_at": started_at,
            "accepted": accepted,
            "updated_at": chrono::Utc::now(),
        });
        write_atomic(&path, serde_json::to_string_pretty(&manifest)?.as_bytes()).await?;
        Ok(accepted)
    }
}

#[async_trait::async_trait]
impl ArtifactStore for FsArtifactStore {
    fn run_id(&self) -> RunId {
        self.run_id
    }

    async fn load_live(&self) -> Result<Option<String>> {
        read_text(&self.live_path()).await
    }

    async fn save_live(&mut self, source: &str) -> Result<()> {
        write_atomic(&self.live_path(), source.as_bytes()).await?;
        debug!("Live slot updated ({} bytes)", source.len());
        Ok(())
    }

    async fn append_generation(&mut self, record: &GenerationRecord, source: &str) -> Result<()> {
        if record.run_id != self.run_id {
            return Err(StorageError::Other(format!(
                "record belongs to run {}, store writes run {}",
                record.run_id, self.run_id
            )));
        }
        fs::create_dir_all(self.run_dir(self.run_id)).await?;

        let path = self.generation_path(self.run_id, record.generation);
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(source.as_bytes()).await?;
        file.flush().await?;

        let json = serde_json::to_string_pretty(record)?;
        fs::write(self.record_path(self.run_id, record.generation), json.as_bytes()).await?;

        let accepted = self.bump_manifest().await?;
        info!("Backup: {} ({} accepted in run)", path.display(), accepted);
        Ok(())
    }

    async fn load_generation(&self, run_id: RunId, generation: u32) -> Result<Option<String>> {
        read_text(&self.generation_path(run_id, generation)).await
    }

    async fn list_generations(&self, run_id: RunId) -> Result<Vec<GenerationRecord>> {
        let dir = self.run_dir(run_id);
        if !fs::try_exists(&dir).await? {
            return Err(StorageError::NotFound(format!("run {}", run_id)));
        }
        let mut records: Vec<GenerationRecord> = list_records(&dir).await?;
        records.sort_by_key(|r| r.generation);
        Ok(records)
    }

    async fn list_runs(&self) -> Result<Vec<RunId>> {
        let mut runs = Vec::new();
        let mut rd = fs::read_dir(self.root.join("runs")).await?;
        while let Some(entry) = rd.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(Ok(id)) = entry.file_name().to_str().map(str::parse::<RunId>) {
                runs.push(id);
            }
        }
        runs.sort();
        Ok(runs)
    }

    async fn reset_to_origin(&mut self) -> Result<Option<PathBuf>> {
        let saved = match self.load_live().await? {
            Some(current) => {
                let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%3f");
                let path = self.root.join("resets").join(format!("before_reset_{}.rs", stamp));
                fs::write(&path, current.as_bytes()).await?;
                info!("Live slot saved to {}", path.display());
                Some(path)
            }
            None => None,
        };
        self.save_live(ORIGIN_SOURCE).await?;
        Ok(saved)
    }
}

/// Write via a sibling temp file and rename, so readers never see a torn file.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_text(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match read_text(path).await? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

async fn list_records(dir: &Path) -> Result<Vec<GenerationRecord>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        let path = entry.path();
        let is_record = path
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|name| name.ends_with(".meta.json"));
        if !is_record {
            continue;
        }
        if let Some(item) = read_json(&path).await? {
            items.push(item);
        }
    }
    Ok(items)
}
