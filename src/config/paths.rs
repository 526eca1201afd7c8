//! Config file and run directory locations

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::constants::paths;

/// Where the config file and the flag files live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config_file: PathBuf,
    pub run_dir: PathBuf,
}

impl Paths {
    /// `/etc/retro-sfx.conf` and `/run/retro-sfx`
    pub fn system() -> Self {
        Self {
            config_file: PathBuf::from(paths::SYSTEM_CONFIG),
            run_dir: PathBuf::from(paths::SYSTEM_RUN_DIR),
        }
    }

    /// Per-user locations (XDG config dir, XDG_RUNTIME_DIR with fallback to cache)
    pub fn user() -> Result<Self> {
        let config_file = dirs::config_dir()
            .context("Failed to determine config directory (no XDG_CONFIG_HOME or HOME)")?
            .join(paths::APP_DIR)
            .join(paths::CONFIG_FILENAME);

        let run_dir = match dirs::runtime_dir() {
            Some(runtime) => runtime.join(paths::APP_DIR),
            None => dirs::cache_dir()
                .context("Failed to determine runtime directory (no XDG_RUNTIME_DIR or HOME)")?
                .join(paths::APP_DIR),
        };

        Ok(Self { config_file, run_dir })
    }

    /// Pick the base locations, then apply explicit overrides
    pub fn resolve(user: bool, config: Option<PathBuf>, run_dir: Option<PathBuf>) -> Result<Self> {
        let mut resolved = if user { Self::user()? } else { Self::system() };
        if let Some(config) = config {
            resolved.config_file = config;
        }
        if let Some(run_dir) = run_dir {
            resolved.run_dir = run_dir;
        }
        Ok(resolved)
    }
}
