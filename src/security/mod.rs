//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_id.rs (who is asking: forwarded header, peer, or "unknown")
//!     → rate_limit.rs (sliding window per category and client)
//!     → handler
//!     → headers.rs (nosniff, frame and referrer policy on the response)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input beyond the configured forwarded header

pub mod client_id;
pub mod headers;
pub mod rate_limit;

pub use client_id::{resolve_client_id, UNKNOWN_CLIENT};
pub use rate_limit::{Category, RateLimiter, SlidingWindowLimiter};
