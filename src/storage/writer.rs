//! Single writer task owning every physical write of the document file.
//!
//! Saves are sent over an unbounded channel and applied one at a time in
//! channel order. Each request carries a oneshot sender that resolves after
//! the rename for that exact request has completed (or failed).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};

use crate::observability::metrics;
use crate::storage::StoreError;

/// Acknowledgement of a completed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Position of this write in the order the writer applied them (from 1).
    pub sequence: u64,
}

struct WriteRequest {
    bytes: Vec<u8>,
    done: oneshot::Sender<Result<WriteReceipt, StoreError>>,
}

/// Handle used to enqueue writes.
#[derive(Clone)]
pub(crate) struct WriterHandle {
    tx: mpsc::UnboundedSender<WriteRequest>,
    queued: Arc<AtomicUsize>,
}

impl WriterHandle {
    /// Spawn the writer task for `path`, staging through `tmp_path`.
    pub(crate) fn spawn(path: PathBuf, tmp_path: PathBuf) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let queued = Arc::new(AtomicUsize::new(0));
        tokio::spawn(run(path, tmp_path, rx, queued.clone()));
        Self { tx, queued }
    }

    /// Enqueue `bytes` and wait until they are on disk.
    ///
    /// The enqueue happens synchronously on the first poll, so the order in
    /// which callers first poll this future is the order writes are applied.
    pub(crate) async fn write(&self, bytes: Vec<u8>) -> Result<WriteReceipt, StoreError> {
        let (done, ack) = oneshot::channel();
        self.queued.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(WriteRequest { bytes, done }).is_err() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return Err(StoreError::WriterClosed);
        }
        metrics::record_write_queue(self.queued.load(Ordering::SeqCst));
        ack.await.map_err(|_| StoreError::WriterClosed)?
    }

    /// Writes enqueued but not yet applied.
    pub(crate) fn pending(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }
}

async fn run(
    path: PathBuf,
    tmp_path: PathBuf,
    mut rx: mpsc::UnboundedReceiver<WriteRequest>,
    queued: Arc<AtomicUsize>,
) {
    let mut sequence = 0u64;
    while let Some(request) = rx.recv().await {
        let start = Instant::now();
        let result = write_atomic(&path, &tmp_path, &request.bytes).await;
        metrics::record_document_write(result.is_ok(), start);

        let depth = queued.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        metrics::record_write_queue(depth);

        let outcome = match result {
            Ok(()) => {
                sequence += 1;
                tracing::debug!(sequence, bytes = request.bytes.len(), "Document written");
                Ok(WriteReceipt { sequence })
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Document write failed");
                Err(e)
            }
        };
        // The caller may have stopped waiting; the write stands either way.
        let _ = request.done.send(outcome);
    }
    tracing::debug!(path = %path.display(), "Document writer stopped");
}

/// Write `bytes` to `tmp_path`, flush to disk, then rename over `path`.
///
/// The canonical file is only ever replaced by a complete file.
pub(crate) async fn write_atomic(path: &Path, tmp_path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let staged = async {
        let mut file = fs::File::create(tmp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await
    }
    .await;

    if let Err(source) = staged {
        discard(tmp_path).await;
        return Err(StoreError::Io {
            path: tmp_path.to_path_buf(),
            source,
        });
    }

    if let Err(source) = fs::rename(tmp_path, path).await {
        discard(tmp_path).await;
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

async fn discard(tmp_path: &Path) {
    if fs::metadata(tmp_path).await.is_ok_and(|m| m.is_file()) {
        let _ = fs::remove_file(tmp_path).await;
    }
}
