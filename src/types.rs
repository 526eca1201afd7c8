//! Core value types shared by the scheduler, pattern tables and backends

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single tone: frequency in Hz and duration in milliseconds.
/// Frequency 0 marks a rest (a fixed pause embedded in a pattern).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BeepSpec {
    pub freq_hz: u32,
    pub duration_ms: u32,
}

impl BeepSpec {
    pub const fn new(freq_hz: u32, duration_ms: u32) -> Self {
        Self { freq_hz, duration_ms }
    }

    pub const fn rest(duration_ms: u32) -> Self {
        Self { freq_hz: 0, duration_ms }
    }

    pub const fn is_rest(&self) -> bool {
        self.freq_hz == 0
    }
}

/// Named personality selecting a pattern table and timing bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Mainframe,
    Wopr,
    Aliensterm,
    Modem,
}

/// How a profile turns its pattern table into sound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternStyle {
    /// Random beep count, sampled from the replicated pattern, every beep jittered
    Chatty,
    /// One variation played exactly as tabled
    Ambient,
}

impl Profile {
    pub const ALL: [Profile; 4] = [
        Profile::Mainframe,
        Profile::Wopr,
        Profile::Aliensterm,
        Profile::Modem,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Mainframe => "mainframe",
            Profile::Wopr => "wopr",
            Profile::Aliensterm => "aliensterm",
            Profile::Modem => "modem",
        }
    }

    /// Prefix of this profile's keys in the config file (e.g. `WOPR_INTERVAL_MIN`)
    pub fn config_prefix(&self) -> &'static str {
        match self {
            Profile::Mainframe => "MAINFRAME",
            Profile::Wopr => "WOPR",
            Profile::Aliensterm => "ALIENSTERM",
            Profile::Modem => "MODEM",
        }
    }

    pub fn style(&self) -> PatternStyle {
        match self {
            Profile::Wopr => PatternStyle::Chatty,
            Profile::Mainframe | Profile::Aliensterm | Profile::Modem => PatternStyle::Ambient,
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Mainframe
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| format!("unknown profile '{}'", s.trim()))
    }
}

/// Output mode as written in the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedMode {
    Pcspkr,
    Audio,
    Random,
    /// Anything else; resolves to no output
    Other(String),
}

impl RequestedMode {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "pcspkr" => RequestedMode::Pcspkr,
            "audio" => RequestedMode::Audio,
            "random" => RequestedMode::Random,
            other => RequestedMode::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RequestedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestedMode::Pcspkr => f.write_str("pcspkr"),
            RequestedMode::Audio => f.write_str("audio"),
            RequestedMode::Random => f.write_str("random"),
            RequestedMode::Other(s) => f.write_str(s),
        }
    }
}

impl Serialize for RequestedMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Output actually used for one emission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Pcspkr,
    Audio,
    None,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Pcspkr => f.write_str("pcspkr"),
            OutputMode::Audio => f.write_str("audio"),
            OutputMode::None => f.write_str("none"),
        }
    }
}
