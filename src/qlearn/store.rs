use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use thiserror::Error;

/// On-disk shape of the table: `"<learner>-<difficulty>-<type>"` -> values.
pub type TableDocument = BTreeMap<String, Vec<f64>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("table serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("table store unavailable: {0}")]
    Unavailable(String),
}

/// Durable mirror of the value table.
///
/// `save` must make the whole document durably visible before it returns.
pub trait TableStore: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<TableDocument>, StoreError>;
    fn save(&self, document: &TableDocument) -> Result<(), StoreError>;
    fn describe(&self) -> String;
}

/// JSON document on the local filesystem, replaced atomically on every save.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "qtable.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl TableStore for JsonFileStore {
    fn load(&self) -> Result<Option<TableDocument>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        if raw.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, document: &TableDocument) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let staging = self.staging_path();
        {
            let mut file = File::create(&staging)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&staging, &self.path)?;

        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Process-local store for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryStore {
    document: Mutex<Option<TableDocument>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: TableDocument) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            ..Self::default()
        }
    }

    /// Makes every subsequent `save` fail until cleared.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Option<TableDocument> {
        self.document.lock().clone()
    }
}

impl TableStore for MemoryStore {
    fn load(&self) -> Result<Option<TableDocument>, StoreError> {
        Ok(self.document.lock().clone())
    }

    fn save(&self, document: &TableDocument) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        *self.document.lock() = Some(document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
