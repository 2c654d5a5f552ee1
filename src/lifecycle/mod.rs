//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Metrics → Open store (bootstrap document) → Bind → Serve
//!
//! Maintenance (maintenance.rs):
//!     Every sweep interval → purge expired sessions → drop idle rate windows
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → broadcast → stop accepting → drain → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: the document exists on disk before the first request
//! - Background tasks hold a shutdown receiver, never a handle to the server

pub mod maintenance;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::StartupError;
