//! Error type shared by the profiler, its config loader and the middleware.

use std::path::PathBuf;

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, ProfilerError>;

#[derive(Debug, Error)]
pub enum ProfilerError {
    /// Toolbar template could not be read from disk.
    #[error("toolbar template {path:?} unreadable: {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Toolbar template has no `{{ toolbar }}` slot to render into.
    #[error("toolbar template {path:?} has no `{{{{ toolbar }}}}` slot")]
    TemplateSlot { path: PathBuf },
    #[error("config: {0}")]
    Config(String),
    /// Response body could not be buffered for toolbar injection.
    #[error("response body: {0}")]
    Body(String),
}
