//! Catalog connector.
//!
//! A small HTTP backend for a curated link catalog: anonymous visitors
//! browse live items, submit new ones for review, and leave contact
//! requests; a PIN-authenticated moderator approves, edits, and exports.
//!
//! ```text
//!   client ──▶ http (CORS, limits, extractors) ──▶ handlers ──▶ storage
//!                 │                                   │          (db.json)
//!                 ├─ security (client id, windows)    └─ catalog (validation)
//!                 └─ admin (sessions, auth guard)
//! ```

pub mod admin;
pub mod catalog;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod storage;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use storage::DocumentStore;
