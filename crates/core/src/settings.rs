use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::IndexLimits;

const ENV_PREFIX: &str = "PHOTOSHELF";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory of the local photo library.
    pub library_dir: PathBuf,
    /// User whose collection is shown.
    pub user: String,
    /// Quiet period before typed query text is applied.
    pub debounce_ms: u64,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub limits: IndexLimits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            library_dir: default_library_dir(),
            user: "local".to_string(),
            debounce_ms: 300,
            log_level: "warn".to_string(),
            limits: IndexLimits::default(),
        }
    }
}

fn default_library_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".photoshelf")
}

impl Settings {
    /// Defaults, overlaid with `path` (TOML, JSON or YAML by extension) when
    /// given, overlaid with `PHOTOSHELF__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::build(path, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn build(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Settings::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(env.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
