//! Run-directory flag files: enabled flag and active profile
//!
//! Each value is a single plain-text scalar in its own file. The daemon only
//! reads them (through [`DaemonState`]); the control subcommands write them.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::paths;
use crate::types::Profile;

/// Read-only view of the daemon's persisted switches
pub trait DaemonState {
    fn is_enabled(&self) -> bool;
    fn current_profile(&self) -> Profile;
}

/// Flag files under a run directory
#[derive(Debug, Clone)]
pub struct FileDaemonState {
    run_dir: PathBuf,
}

impl FileDaemonState {
    pub fn new(run_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_dir: run_dir.into(),
        }
    }

    fn enabled_path(&self) -> PathBuf {
        self.run_dir.join(paths::ENABLED_FILE)
    }

    fn profile_path(&self) -> PathBuf {
        self.run_dir.join(paths::PROFILE_FILE)
    }

    fn read_scalar(path: &Path) -> Option<String> {
        fs::read_to_string(path)
            .inspect_err(|e| debug!(path = %path.display(), error = %e, "Flag file not readable"))
            .ok()
            .map(|s| s.trim().to_string())
    }

    fn write_scalar(&self, path: &Path, value: &str) -> Result<()> {
        fs::create_dir_all(&self.run_dir)
            .with_context(|| format!("Failed to create run directory {}", self.run_dir.display()))?;
        fs::write(path, value)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.write_scalar(&self.enabled_path(), if enabled { "1" } else { "0" })?;
        info!(enabled = enabled, "Updated enabled flag");
        Ok(())
    }

    pub fn set_profile(&self, profile: Profile) -> Result<()> {
        self.write_scalar(&self.profile_path(), profile.as_str())?;
        info!(profile = %profile, "Updated profile");
        Ok(())
    }

    /// Create the run directory and any missing flag files with defaults.
    /// Failures are logged; the daemon runs on defaults without them.
    pub fn ensure_defaults(&self) {
        if !self.profile_path().exists() {
            if let Err(e) = self.set_profile(Profile::default()) {
                warn!(error = %e, "Cannot initialize profile file");
            }
        }
        if !self.enabled_path().exists() {
            if let Err(e) = self.set_enabled(true) {
                warn!(error = %e, "Cannot initialize enabled file");
            }
        }
    }
}

impl DaemonState for FileDaemonState {
    /// Missing file means enabled
    fn is_enabled(&self) -> bool {
        Self::read_scalar(&self.enabled_path()).is_none_or(|v| v == "1")
    }

    /// Missing or unrecognised profile means mainframe
    fn current_profile(&self) -> Profile {
        Self::read_scalar(&self.profile_path())
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}
