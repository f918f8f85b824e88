//! Profiler config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{ProfilerError, Result};

pub use schema::{CaptureLevel, Config, ProfilerSection, ServerSection};

/// Env var naming the config file; defaults to [`DEFAULT_PATH`].
pub const PATH_ENV: &str = "PROFILER_CONFIG";
pub const DEFAULT_PATH: &str = "profiler.yaml";

pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| ProfilerError::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<Config> {
    let cfg: Config =
        serde_yaml::from_str(s).map_err(|e| ProfilerError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load from `$PROFILER_CONFIG`, else `profiler.yaml`. A missing default
/// file yields the defaults; a missing explicitly named file is an error.
pub fn load_from_env() -> Result<Config> {
    if let Ok(path) = std::env::var(PATH_ENV) {
        return load_from_file(path);
    }
    match fs::read_to_string(DEFAULT_PATH) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(ProfilerError::Config(format!("read {DEFAULT_PATH} failed: {e}"))),
    }
}
