//! Occasional playback of real audio files
//!
//! Beeper-only hosts cannot play files, so they get a short beep sequence
//! derived deterministically from the file path instead.

use rand::Rng;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{Settings, SoundSettings};
use crate::constants::{paths, pseudo, sounds, timing};
use crate::hardware::HardwareProbe;
use crate::output::SoundOutput;
use crate::patterns;
use crate::types::{BeepSpec, OutputMode};

/// Directory to take files from: an explicit setting wins, then a `sounds/`
/// directory next to the executable, then the configured default
pub fn resolve_dir(settings: &SoundSettings, colocated: Option<&Path>) -> PathBuf {
    if settings.has_explicit_dir() {
        return settings.dir.clone();
    }
    match colocated {
        Some(dir) if dir.is_dir() => dir.to_path_buf(),
        _ => settings.dir.clone(),
    }
}

fn has_sound_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| sounds::EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Playable files directly inside `dir`, sorted
pub fn list_sound_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Sound directory not readable");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_sound_extension(path))
        .collect();
    files.sort();
    files
}

/// Beeps standing in for `path` on a beeper, `clamp(seconds * 2, 5, 15)` of them
pub fn pseudo_beeps(path: &Path, duration_seconds: u32) -> Vec<BeepSpec> {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    let count = (duration_seconds as usize * 2).clamp(pseudo::MIN_BEEPS, pseudo::MAX_BEEPS);
    let segment = duration_seconds * 1000 / count as u32;

    digest
        .iter()
        .take(count)
        .map(|&byte| {
            let byte = u32::from(byte);
            let freq = pseudo::MIN_FREQ_HZ + byte * pseudo::FREQ_SPAN_HZ / 255;
            let duration =
                (segment + byte % pseudo::DUR_MODULUS).clamp(pseudo::MIN_DUR_MS, pseudo::MAX_DUR_MS);
            BeepSpec::new(freq, duration)
        })
        .collect()
}

/// What one sound-file turn did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// No candidate files; nothing played and nothing slept
    NoFiles,
    Played(PathBuf),
    /// Every output failed; the interval was still slept
    Failed(PathBuf),
}

pub struct SoundFilePlayer {
    colocated_dir: Option<PathBuf>,
}

impl SoundFilePlayer {
    /// Looks for a `sounds/` directory next to the running executable
    pub fn new() -> Self {
        Self::with_colocated_dir(
            std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|dir| dir.join(paths::COLOCATED_SOUNDS_DIR))),
        )
    }

    pub fn with_colocated_dir(colocated_dir: Option<PathBuf>) -> Self {
        Self { colocated_dir }
    }

    pub fn sound_dir(&self, settings: &SoundSettings) -> PathBuf {
        resolve_dir(settings, self.colocated_dir.as_deref())
    }

    /// Play one random file, then sleep the sound interval
    pub async fn run<P, R>(&self, settings: &Settings, output: &SoundOutput<P>, rng: &mut R) -> FileOutcome
    where
        P: HardwareProbe,
        R: Rng + ?Sized,
    {
        let dir = self.sound_dir(&settings.sounds);
        let files = list_sound_files(&dir);
        if files.is_empty() {
            debug!(dir = %dir.display(), "No sound files found");
            return FileOutcome::NoFiles;
        }

        let path = files[rng.gen_range(0..files.len())].clone();
        let bounds = settings.sounds.duration_seconds;
        let seconds = rng.gen_range(bounds.min..=bounds.max);

        let played = match output.pick_mode(settings, rng).await {
            OutputMode::Pcspkr => play_pseudo_beeps(output, &path, seconds).await,
            OutputMode::Audio => {
                output.play_file(settings, &path, seconds).await
                    || (output.probe().beeper_available().await
                        && play_pseudo_beeps(output, &path, seconds).await)
            }
            OutputMode::None => false,
        };

        if played {
            info!(file = %path.display(), seconds, "Played sound file");
        } else {
            debug!(file = %path.display(), "Sound file could not be played");
        }

        let pause = patterns::interval(settings.sounds.interval_minutes, rng);
        debug!(seconds = pause.as_secs(), "Sleeping after sound file");
        tokio::time::sleep(pause).await;

        if played {
            FileOutcome::Played(path)
        } else {
            FileOutcome::Failed(path)
        }
    }
}

impl Default for SoundFilePlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Beep the path-derived sequence until `seconds` of it has played
async fn play_pseudo_beeps<P: HardwareProbe>(
    output: &SoundOutput<P>,
    path: &Path,
    seconds: u32,
) -> bool {
    let limit = Duration::from_secs(u64::from(seconds));
    let pause = Duration::from_millis(timing::PSEUDO_BEEP_PAUSE_MS);
    let mut elapsed = Duration::ZERO;
    let mut any = false;

    for beep in pseudo_beeps(path, seconds) {
        if elapsed >= limit {
            break;
        }
        any |= output.beep(beep).await;
        tokio::time::sleep(pause).await;
        elapsed += Duration::from_millis(u64::from(beep.duration_ms)) + pause;
    }
    any
}
