//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request id, trace span, timeout, CORS, security headers)
//!     → middleware/ (per-route rate limit guard, request metrics)
//!     → request.rs (client id, body decoding)
//!     → handlers.rs / admin::handlers (domain operation against the store)
//!     → response.rs (JSON error envelope)
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ClientId, Payload};
pub use response::ApiError;
pub use server::{AppState, HttpServer};
