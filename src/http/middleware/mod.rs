pub mod rate_limit;
pub mod telemetry;

pub use rate_limit::{rate_limit_middleware, RateLimitGuard};
pub use telemetry::track_requests;
