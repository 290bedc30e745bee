//! Security module
//!
//! - [`rate_limit`]: per-client request rate limiting
//! - [`middleware`]: axum middleware applying the limiter to HTTP routes

pub mod middleware;
pub mod rate_limit;

pub use middleware::{client_ip, rate_limit_middleware};
pub use rate_limit::RateLimiter;
