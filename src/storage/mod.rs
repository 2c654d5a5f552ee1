//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! load():
//!     read <data_dir>/db.json
//!     → missing / unparsable: default document → save → return
//!     → otherwise decode (unknown fields kept)
//!
//! save(doc):
//!     encode → writer queue (FIFO, one write in flight)
//!     → db.json.tmp (write + fsync) → rename over db.json
//!     → caller's future resolves
//!
//! mutate(f):
//!     txn lock → load → f(&mut doc) → save → unlock
//! ```
//!
//! # Design Decisions
//! - No in-memory cache: the file is the source of truth
//! - Readers never see a partial file (rename is atomic on one filesystem)
//! - A failed write leaves the committed file untouched and reaches the caller

use std::path::PathBuf;

use thiserror::Error;

pub mod document_store;
pub mod writer;

pub use document_store::DocumentStore;
pub use writer::WriteReceipt;

/// Storage failures. Never recoverable within a request.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document at {path} does not match the expected schema: {source}", path = .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("document writer is not running")]
    WriterClosed,
}
