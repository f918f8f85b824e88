//! Request profiler for axum services.
//!
//! Each request gets a [`profiler::ProfileSession`] that collects `tracing`
//! events, executed SQL (with bindings interpolated for display) and the
//! request's memory/time cost. Interactive HTML responses get the result
//! appended as a toolbar; AJAX and non-HTML responses are left untouched.
//!
//! The rest of the crate is a small demo application wired through the
//! profiler middleware.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod mock_data;
pub mod profiler;
pub mod server;
pub mod store;

pub use error::{ProfilerError, Result};
pub use profiler::{Profiler, ProfileSession};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// In-memory user directory the demo pages query.
    pub store: Arc<store::UserStore>,

    /// Hands out one profile session per request.
    pub profiler: Arc<Profiler>,
}
