//! REST API module for spam-rs
//!
//! Provides the HTTP endpoints for mail classification

pub mod handlers;
pub mod server;

pub use handlers::AppState;
pub use server::{build_router, ApiServer};
