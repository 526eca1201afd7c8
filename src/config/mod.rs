//! Configuration management for retro-sfx
//!
//! - **store**: raw `KEY=value` file, read per tick and edited by the control commands
//! - **settings**: typed, clamped snapshot built from the store
//! - **profile**: per-profile variation and timing settings
//! - **daemon_state**: enabled/profile flag files in the run directory
//! - **paths**: system and per-user file locations

pub mod daemon_state;
pub mod paths;
pub mod profile;
pub mod settings;
pub mod store;

// Re-export commonly used types
pub use daemon_state::{DaemonState, FileDaemonState};
pub use paths::Paths;
pub use profile::{ProfileSettings, VariationSet};
pub use settings::{Bounds, LimiterSettings, Settings, SettingsSource, SoundSettings};
pub use store::ConfigStore;
