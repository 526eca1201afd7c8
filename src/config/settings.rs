//! Typed settings snapshot
//!
//! Built once per scheduler tick from the raw key/value map. Every default
//! and every clamp lives here; downstream code never re-parses strings.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::constants::{hardware, sounds, validation};
use crate::quiet_hours::QuietWindow;
use crate::types::{Profile, RequestedMode};

use super::profile::{ProfileSettings, VariationSet};
use super::store::ConfigStore;

/// Inclusive numeric range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Read-only view over the raw map with typed, defaulting accessors
pub(crate) struct Fields<'a> {
    map: &'a HashMap<String, String>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(map: &'a HashMap<String, String>) -> Self {
        Self { map }
    }

    pub(crate) fn raw(&self, key: &str) -> Option<&'a str> {
        self.map.get(key).map(String::as_str)
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        match self.raw(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("1" | "true" | "yes" | "on") => true,
            Some("0" | "false" | "no" | "off") => false,
            None => default,
            Some(other) => {
                debug!(key = key, value = other, default = default, "Invalid flag, using default");
                default
            }
        }
    }

    fn number<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + Copy + std::fmt::Debug,
    {
        match self.raw(key) {
            None => default,
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                debug!(key = key, value = value, default = ?default, "Invalid number, using default");
                default
            }),
        }
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.raw(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
            .to_string()
    }

    /// Parse a min/max pair, clamp both into `limits`, and raise max to min
    /// when they cross
    pub(crate) fn bounds(&self, min_key: &str, max_key: &str, default: Bounds, limits: Bounds) -> Bounds {
        let clamp = |key: &str, fallback: u32| -> u32 {
            let value: i64 = self.number(key, i64::from(fallback));
            let clamped = value.clamp(i64::from(limits.min), i64::from(limits.max));
            if clamped != value {
                debug!(key = key, value = value, clamped = clamped, "Value out of range, clamping");
            }
            clamped as u32
        };

        let min = clamp(min_key, default.min);
        let max = clamp(max_key, default.max);
        if min > max {
            debug!(min_key = min_key, min = min, max = max, "min exceeds max, raising max");
            Bounds::new(min, min)
        } else {
            Bounds::new(min, max)
        }
    }
}

/// Compressor settings handed to sox when the limiter is on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimiterSettings {
    pub enabled: bool,
    pub attack: f32,
    pub decay: f32,
    pub soft_knee_db: f32,
    pub target_db: f32,
}

/// Digital audio output settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioSettings {
    /// ALSA device name; `default` or `none` means auto-detect
    pub device: String,
    pub gain: f32,
    pub limiter: LimiterSettings,
}

impl AudioSettings {
    pub fn wants_autodetect(&self) -> bool {
        self.device == hardware::DEFAULT_DEVICE || self.device == "none"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuietSettings {
    pub enabled: bool,
    pub window: QuietWindow,
}

/// Sound-file playback settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoundSettings {
    pub enabled: bool,
    pub dir: PathBuf,
    /// Play length in seconds
    pub duration_seconds: Bounds,
    /// Pause after a file, in minutes
    pub interval_minutes: Bounds,
}

impl SoundSettings {
    /// True when the directory was set to something other than the built-in path
    pub fn has_explicit_dir(&self) -> bool {
        self.dir != Path::new(sounds::DEFAULT_DIR)
    }
}

/// Immutable per-tick configuration snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub output_mode: RequestedMode,
    pub random_audio_percent: u8,
    pub quiet: QuietSettings,
    pub audio: AudioSettings,
    pub mainframe: ProfileSettings,
    pub wopr: ProfileSettings,
    pub aliensterm: ProfileSettings,
    pub modem: ProfileSettings,
    pub sounds: SoundSettings,
}

impl Settings {
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let fields = Fields::new(map);

        let output_mode = RequestedMode::parse(&fields.string("OUTPUT_MODE", "random"));

        let percent: i64 = fields.number("RANDOM_AUDIO_PERCENT", 70);
        let random_audio_percent =
            percent.clamp(0, i64::from(validation::MAX_PERCENT)) as u8;

        let window = QuietWindow::from_strings(fields.raw("QUIET_START"), fields.raw("QUIET_END"));

        let gain: f32 = fields.number("AUDIO_GAIN", 1.0);
        let gain = if gain.is_finite() {
            gain.clamp(validation::MIN_GAIN, validation::MAX_GAIN)
        } else {
            1.0
        };

        let audio = AudioSettings {
            device: fields.string("AUDIO_DEVICE", hardware::DEFAULT_DEVICE),
            gain,
            limiter: LimiterSettings {
                enabled: fields.flag("LIMITER_ENABLED", false),
                attack: fields.number("LIM_ATTACK", 0.005),
                decay: fields.number("LIM_DECAY", 0.10),
                soft_knee_db: fields.number("LIM_SOFTKNEE", 6.0),
                target_db: fields.number("LIM_TARGET_DB", -3.0),
            },
        };

        let sounds = SoundSettings {
            enabled: fields.flag("SOUNDS_ENABLED", false),
            dir: PathBuf::from(fields.string("SOUNDS_DIR", sounds::DEFAULT_DIR)),
            duration_seconds: fields.bounds(
                "SOUNDS_DURATION_MIN",
                "SOUNDS_DURATION_MAX",
                Bounds::new(3, 10),
                Bounds::new(validation::MIN_SOUND_SECONDS, validation::MAX_SOUND_SECONDS),
            ),
            interval_minutes: fields.bounds(
                "SOUNDS_INTERVAL_MIN",
                "SOUNDS_INTERVAL_MAX",
                Bounds::new(5, 15),
                Bounds::new(validation::MIN_INTERVAL_MINUTES, validation::MAX_INTERVAL_MINUTES),
            ),
        };

        Self {
            output_mode,
            random_audio_percent,
            quiet: QuietSettings {
                enabled: fields.flag("QUIET_ENABLED", true),
                window,
            },
            audio,
            mainframe: ProfileSettings::from_fields(&fields, Profile::Mainframe),
            wopr: ProfileSettings::from_fields(&fields, Profile::Wopr),
            aliensterm: ProfileSettings::from_fields(&fields, Profile::Aliensterm),
            modem: ProfileSettings::from_fields(&fields, Profile::Modem),
            sounds,
        }
    }

    pub fn profile(&self, profile: Profile) -> &ProfileSettings {
        match profile {
            Profile::Mainframe => &self.mainframe,
            Profile::Wopr => &self.wopr,
            Profile::Aliensterm => &self.aliensterm,
            Profile::Modem => &self.modem,
        }
    }

    /// Variations a profile may draw from this tick
    pub fn enabled_variations(&self, profile: Profile) -> &VariationSet {
        &self.profile(profile).variations
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_map(&HashMap::new())
    }
}

/// Anything that can produce a fresh settings snapshot
pub trait SettingsSource {
    fn load(&self) -> Settings;
}

impl SettingsSource for ConfigStore {
    fn load(&self) -> Settings {
        Settings::from_map(&ConfigStore::load(self))
    }
}
