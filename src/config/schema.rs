use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::Level;

use crate::error::{ProfilerError, Result};
use crate::profiler::Dialect;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub profiler: ProfilerSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            profiler: ProfilerSection::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ProfilerError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.server.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            ProfilerError::Config(format!(
                "server.listen must be a valid socket address, got {:?}",
                self.listen
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilerSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Quoting rules used when interpolating query bindings.
    #[serde(default)]
    pub dialect: Dialect,

    /// Least severe `tracing` level copied into the toolbar.
    #[serde(default)]
    pub capture_level: CaptureLevel,

    /// Toolbar template to use instead of the bundled one.
    #[serde(default)]
    pub template_path: Option<PathBuf>,
}

impl Default for ProfilerSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            dialect: Dialect::default(),
            capture_level: CaptureLevel::default(),
            template_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl From<CaptureLevel> for Level {
    fn from(level: CaptureLevel) -> Self {
        match level {
            CaptureLevel::Trace => Level::TRACE,
            CaptureLevel::Debug => Level::DEBUG,
            CaptureLevel::Info => Level::INFO,
            CaptureLevel::Warn => Level::WARN,
            CaptureLevel::Error => Level::ERROR,
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_enabled() -> bool {
    true
}
