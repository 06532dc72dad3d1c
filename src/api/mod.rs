//! HTTP API for the dashboard
//!
//! Provides:
//! - Friend CRUD with derived connection metrics
//! - Interaction logging
//! - Overview and weekly statistics

pub mod error;
pub mod handlers;
pub mod server;

pub use server::{build_router, ApiServer, ApiServerConfig, AppState};
