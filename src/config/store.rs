//! Plain-text `KEY=value` config file
//!
//! The daemon only ever reads this file (once per tick). The control
//! subcommands rewrite single keys in place, leaving comments and unknown
//! keys untouched.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Handle on the config file at a fixed path
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the raw key/value map. A missing or unreadable file yields an
    /// empty map so every key falls back to its default.
    pub fn load(&self) -> HashMap<String, String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => parse(&contents),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Config file not found, using defaults");
                HashMap::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read config file, using defaults");
                HashMap::new()
            }
        }
    }

    /// Replace the first `KEY=` line or append a new one
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let existing = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config from {}", self.path.display()));
            }
        };

        let updated = upsert(&existing, key, value);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory {}", parent.display())
                })?;
            }
        }

        fs::write(&self.path, updated)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))?;

        info!(path = %self.path.display(), key = key, value = value, "Updated config key");
        Ok(())
    }
}

/// Parse `KEY=value` lines. Blank lines, `#` comments and lines without `=`
/// are skipped; one pair of surrounding quotes is stripped from values.
pub fn parse(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), unquote(value.trim()).to_string()))
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn upsert(contents: &str, key: &str, value: &str) -> String {
    let prefix = format!("{key}=");
    let mut replaced = false;
    let mut lines: Vec<String> = Vec::new();

    for line in contents.lines() {
        if !replaced && line.trim_start().starts_with(&prefix) {
            lines.push(format!("{key}={value}"));
            replaced = true;
        } else {
            lines.push(line.to_string());
        }
    }

    if !replaced {
        lines.push(format!("{key}={value}"));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let map = parse("# header\n\nOUTPUT_MODE=audio\n  # indented comment\nnot a pair\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("OUTPUT_MODE").map(String::as_str), Some("audio"));
    }

    #[test]
    fn test_parse_strips_quotes_and_whitespace() {
        let map = parse("QUIET_START = \"22:30\"\nAUDIO_DEVICE='hw:0,0'\n");
        assert_eq!(map.get("QUIET_START").map(String::as_str), Some("22:30"));
        assert_eq!(map.get("AUDIO_DEVICE").map(String::as_str), Some("hw:0,0"));
    }

    #[test]
    fn test_parse_keeps_equals_in_value() {
        let map = parse("SOUNDS_DIR=/srv/a=b\n");
        assert_eq!(map.get("SOUNDS_DIR").map(String::as_str), Some("/srv/a=b"));
    }

    #[test]
    fn test_upsert_replaces_existing_line() {
        let out = upsert("# c\nOUTPUT_MODE=pcspkr\nQUIET_ENABLED=1\n", "OUTPUT_MODE", "audio");
        assert_eq!(out, "# c\nOUTPUT_MODE=audio\nQUIET_ENABLED=1\n");
    }

    #[test]
    fn test_upsert_appends_missing_key() {
        let out = upsert("QUIET_ENABLED=1", "LIMITER_ENABLED", "1");
        assert_eq!(out, "QUIET_ENABLED=1\nLIMITER_ENABLED=1\n");
    }

    #[test]
    fn test_upsert_does_not_match_key_prefix() {
        let out = upsert("WOPR_BEEPS_MIN=2\n", "WOPR_BEEPS", "3");
        assert_eq!(out, "WOPR_BEEPS_MIN=2\nWOPR_BEEPS=3\n");
    }

    #[test]
    fn test_set_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("retro-sfx.conf"));

        store.set("QUIET_START", "\"23:15\"").unwrap();
        store.set("WOPR_ENABLED_VARIATIONS", "1,4,7").unwrap();
        store.set("QUIET_START", "\"21:00\"").unwrap();

        let map = store.load();
        assert_eq!(map.get("QUIET_START").map(String::as_str), Some("21:00"));
        assert_eq!(map.get("WOPR_ENABLED_VARIATIONS").map(String::as_str), Some("1,4,7"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("absent.conf"));
        assert!(store.load().is_empty());
    }
}
