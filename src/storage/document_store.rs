//! The document store: crash-safe persistence of the catalog document.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;

use crate::catalog::model::{now_millis, Document, Lead};
use crate::config::StorageConfig;
use crate::storage::writer::{WriteReceipt, WriterHandle};
use crate::storage::StoreError;

/// Leads file kept beside the document by earlier deployments.
const LEGACY_LEADS_FILE: &str = "leads.json";

enum Snapshot {
    Found(Document),
    Missing,
    Corrupt,
}

/// Owner of the on-disk document.
///
/// Every [`load`](Self::load) re-reads the file. Writes go through a single
/// FIFO writer; [`mutate`](Self::mutate) additionally serializes whole
/// read-modify-write cycles so concurrent edits cannot overwrite each other.
pub struct DocumentStore {
    path: PathBuf,
    default_title: String,
    writer: WriterHandle,
    txn: Mutex<()>,
}

impl DocumentStore {
    /// Open (and if needed create) the document described by `config`.
    ///
    /// Must be called inside a Tokio runtime: it spawns the writer task.
    pub async fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        fs::create_dir_all(&config.data_dir)
            .await
            .map_err(|source| StoreError::Io {
                path: PathBuf::from(&config.data_dir),
                source,
            })?;

        let path = config.document_path();
        let store = Self {
            writer: WriterHandle::spawn(path.clone(), staging_path(&path)),
            path,
            default_title: config.default_title.clone(),
            txn: Mutex::new(()),
        };

        store
            .import_legacy_leads(&Path::new(&config.data_dir).join(LEGACY_LEADS_FILE))
            .await?;

        let doc = store.load().await?;
        tracing::info!(
            path = %store.path.display(),
            items = doc.items.len(),
            leads = doc.leads.len(),
            "Document store ready"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saves accepted but not yet on disk.
    pub fn pending_writes(&self) -> usize {
        self.writer.pending()
    }

    /// Read the current document from disk.
    ///
    /// A missing or unparsable file is replaced by a default document, which
    /// is persisted before it is returned.
    pub async fn load(&self) -> Result<Document, StoreError> {
        if let Snapshot::Found(doc) = self.read_snapshot().await? {
            return Ok(doc);
        }
        // Bootstrapping writes, so it must not race a concurrent mutate().
        let _txn = self.txn.lock().await;
        self.read_or_bootstrap().await
    }

    /// Persist `doc`, resolving once it has been renamed into place.
    ///
    /// Queued behind any in-flight or earlier saves. Callers that derived
    /// `doc` from a previous `load` should use [`mutate`](Self::mutate).
    pub async fn save(&self, doc: &Document) -> Result<WriteReceipt, StoreError> {
        let bytes = serde_json::to_vec_pretty(doc).map_err(StoreError::Encode)?;
        self.writer.write(bytes).await
    }

    /// Load, apply `f`, and save as one unit relative to other `mutate` calls.
    ///
    /// When `f` fails nothing is written and its error is returned.
    pub async fn mutate<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Document) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _txn = self.txn.lock().await;
        let mut doc = self.read_or_bootstrap().await?;
        let out = f(&mut doc)?;
        self.save(&doc).await?;
        Ok(out)
    }

    /// Fold a standalone leads file into the document, then move it aside
    /// as `<name>.imported`. Leads whose id is already present are skipped.
    async fn import_legacy_leads(&self, legacy: &Path) -> Result<usize, StoreError> {
        let bytes = match fs::read(legacy).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(StoreError::Io {
                    path: legacy.to_path_buf(),
                    source,
                })
            }
        };
        let leads = match serde_json::from_slice::<Option<Vec<Lead>>>(&bytes) {
            Ok(leads) => leads.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(path = %legacy.display(), error = %e, "Legacy leads file is unreadable; left in place");
                return Ok(0);
            }
        };

        let imported = self
            .mutate(|doc: &mut Document| {
                let known: HashSet<&str> = doc.leads.iter().map(|l| l.id.as_str()).collect();
                let fresh: Vec<Lead> = leads
                    .into_iter()
                    .filter(|l| l.id.is_empty() || !known.contains(l.id.as_str()))
                    .collect();
                let count = fresh.len();
                // Older than anything captured since.
                let newer = std::mem::replace(&mut doc.leads, fresh);
                doc.leads.extend(newer);
                Ok::<_, StoreError>(count)
            })
            .await?;

        let mut target = legacy.as_os_str().to_os_string();
        target.push(".imported");
        if let Err(e) = fs::rename(legacy, &target).await {
            tracing::warn!(path = %legacy.display(), error = %e, "Imported legacy leads but could not move the file aside");
        }
        tracing::info!(path = %legacy.display(), imported, "Imported legacy leads");
        Ok(imported)
    }

    async fn read_snapshot(&self) -> Result<Snapshot, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Snapshot::Missing),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value)
                .map(Snapshot::Found)
                .map_err(|source| StoreError::Decode {
                    path: self.path.clone(),
                    source,
                }),
            _ => Ok(Snapshot::Corrupt),
        }
    }

    /// Caller must hold `txn`.
    async fn read_or_bootstrap(&self) -> Result<Document, StoreError> {
        match self.read_snapshot().await? {
            Snapshot::Found(doc) => Ok(doc),
            Snapshot::Missing => self.bootstrap().await,
            Snapshot::Corrupt => {
                self.quarantine().await;
                self.bootstrap().await
            }
        }
    }

    async fn bootstrap(&self) -> Result<Document, StoreError> {
        let doc = Document::with_title(self.default_title.clone());
        self.save(&doc).await?;
        tracing::info!(path = %self.path.display(), "Initialized default document");
        Ok(doc)
    }

    async fn quarantine(&self) {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let target = self
            .path
            .with_file_name(format!("{file_name}.corrupt-{}", now_millis()));

        match fs::rename(&self.path, &target).await {
            Ok(()) => tracing::warn!(
                path = %self.path.display(),
                moved_to = %target.display(),
                "Document was unparsable; moved aside"
            ),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Document was unparsable and could not be moved aside"
            ),
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
