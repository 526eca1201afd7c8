//! Host probing: PC speaker and digital audio availability
//!
//! Probes are read-only. Every external call is time-bounded and any
//! failure simply reads as "not available".

use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::backend::command::capture_bounded;
use crate::backend::first_success;
use crate::constants::{hardware, programs, timing};

#[async_trait]
pub trait HardwareProbe: Send + Sync {
    async fn beeper_available(&self) -> bool;
    async fn audio_available(&self) -> bool;
    /// Best ALSA device name, or None when there is no audio hardware
    async fn detect_audio_device(&self) -> Option<String>;
}

/// Probes the running system through /proc, /sys, `beep` and `aplay`
#[derive(Debug, Clone)]
pub struct SystemProbe {
    proc_modules: PathBuf,
    pcspkr_paths: Vec<PathBuf>,
    asound_cards: PathBuf,
    sys_sound_dir: PathBuf,
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self {
            proc_modules: PathBuf::from(hardware::PROC_MODULES),
            pcspkr_paths: hardware::PCSPKR_PATHS.iter().map(PathBuf::from).collect(),
            asound_cards: PathBuf::from(hardware::ASOUND_CARDS),
            sys_sound_dir: PathBuf::from(hardware::SYS_SOUND_DIR),
        }
    }
}

impl SystemProbe {
    pub fn new() -> Self {
        Self::default()
    }

    fn pcspkr_module_loaded(&self) -> bool {
        fs::read_to_string(&self.proc_modules)
            .inspect_err(|e| debug!(path = %self.proc_modules.display(), error = %e, "Cannot read module list"))
            .is_ok_and(|text| module_loaded(&text, hardware::PCSPKR_MODULE))
    }

    fn pcspkr_device_present(&self) -> bool {
        self.pcspkr_paths
            .iter()
            .any(|p| p.exists() || p.parent().is_some_and(|parent| parent.exists()))
    }

    fn kernel_lists_cards(&self) -> bool {
        fs::read_to_string(&self.asound_cards).is_ok_and(|text| count_sound_cards(&text) > 0)
    }

    fn sysfs_lists_cards(&self) -> bool {
        fs::read_dir(&self.sys_sound_dir).is_ok_and(|entries| {
            entries
                .flatten()
                .any(|e| e.file_name().to_string_lossy().starts_with("card"))
        })
    }
}

async fn aplay_list() -> Option<String> {
    capture_bounded(programs::APLAY, ["-l"], timing::PROBE_TIMEOUT)
        .await
        .inspect_err(|e| debug!(error = %e, "aplay -l failed"))
        .ok()
}

#[async_trait]
impl HardwareProbe for SystemProbe {
    async fn beeper_available(&self) -> bool {
        if !self.pcspkr_module_loaded() {
            return false;
        }

        if let Err(e) = which::which(programs::BEEP) {
            debug!(error = %e, "beep command not found");
            return false;
        }

        if !self.pcspkr_device_present() {
            // Module is loaded; assume the speaker works without a device node
            debug!("pcspkr module loaded but no device node found");
        }
        true
    }

    async fn audio_available(&self) -> bool {
        if self.kernel_lists_cards() {
            return true;
        }

        if aplay_list().await.is_some_and(|out| out.contains("card")) {
            return true;
        }

        self.sysfs_lists_cards()
    }

    async fn detect_audio_device(&self) -> Option<String> {
        if !self.audio_available().await {
            return None;
        }

        let mut candidates: Vec<String> = hardware::MIXER_DEVICES
            .iter()
            .map(|d| d.to_string())
            .collect();
        if let Some(card) = aplay_list().await.as_deref().and_then(analog_card_device) {
            candidates.push(card);
        }
        candidates.push(hardware::DEFAULT_DEVICE.to_string());

        let found = first_success(candidates.iter().map(String::as_str), |device| async move {
            capture_bounded(programs::APLAY, ["-D", device, "-l"], timing::PROBE_TIMEOUT)
                .await
                .map(|_| ())
        })
        .await;

        Some(found.unwrap_or(hardware::DEFAULT_DEVICE).to_string())
    }
}

/// True if `/proc/modules` text lists `name`
pub fn module_loaded(text: &str, name: &str) -> bool {
    text.lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|module| module == name)
}

/// Count card header lines in `/proc/asound/cards` (` 0 [PCH   ]: ...`)
pub fn count_sound_cards(text: &str) -> usize {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
            digits > 0 && trimmed[digits..].trim_start().starts_with('[')
        })
        .count()
}

/// `hw:<card>,0` for the first `aplay -l` entry with an analog label
pub fn analog_card_device(aplay_output: &str) -> Option<String> {
    aplay_output
        .lines()
        .filter(|line| line.starts_with("card "))
        .find(|line| hardware::ANALOG_LABELS.iter().any(|label| line.contains(label)))
        .and_then(|line| number_after(line, "card "))
        .map(|card| format!("hw:{card},0"))
}

fn number_after(line: &str, marker: &str) -> Option<u32> {
    let rest = &line[line.find(marker)? + marker.len()..];
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const APLAY_L: &str = "**** List of PLAYBACK Hardware Devices ****\n\
card 0: HDMI [HDA Intel HDMI], device 3: HDMI 0 [HDMI 0]\n\
  Subdevices: 1/1\n\
card 1: PCH [HDA Intel PCH], device 0: ALC892 Analog [ALC892 Analog]\n\
  Subdevices: 1/1\n";

    const ASOUND_CARDS: &str = " 0 [HDMI           ]: HDA-Intel - HDA Intel HDMI\n\
                      HDA Intel HDMI at 0xf7e14000 irq 33\n\
 1 [PCH            ]: HDA-Intel - HDA Intel PCH\n\
                      HDA Intel PCH at 0xf7e10000 irq 32\n";

    #[test]
    fn test_module_loaded() {
        let modules = "snd_hda_intel 53248 3 - Live 0x0\npcspkr 16384 0 - Live 0x0\n";
        assert!(module_loaded(modules, "pcspkr"));
        assert!(!module_loaded(modules, "snd_pcsp"));
        assert!(!module_loaded("pcspkr_extra 1 0\n", "pcspkr"));
    }

    #[test]
    fn test_count_sound_cards() {
        assert_eq!(count_sound_cards(ASOUND_CARDS), 2);
        assert_eq!(count_sound_cards("--- no soundcards ---\n"), 0);
        assert_eq!(count_sound_cards("10 [USB            ]: USB-Audio - Dongle\n"), 1);
    }

    #[test]
    fn test_analog_card_device() {
        assert_eq!(analog_card_device(APLAY_L), Some("hw:1,0".to_string()));
        assert_eq!(
            analog_card_device("card 2: X [X], device 0: HDMI [HDMI]\n"),
            None
        );
        assert_eq!(analog_card_device(""), None);
    }

    #[test]
    fn test_analog_card_device_uses_first_device() {
        assert_eq!(
            analog_card_device("card 3: PCH [HDA Intel PCH], device 2: ALC892 Alt Analog [ALC892 Alt Analog]\n"),
            Some("hw:3,0".to_string())
        );
    }

    fn probe_in(dir: &std::path::Path) -> SystemProbe {
        SystemProbe {
            proc_modules: dir.join("modules"),
            pcspkr_paths: vec![dir.join("input").join("platform-pcspkr")],
            asound_cards: dir.join("cards"),
            sys_sound_dir: dir.join("sound"),
        }
    }

    #[tokio::test]
    async fn test_beeper_unavailable_without_module() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("modules"), "snd_hda_intel 1 0\n").unwrap();
        assert!(!probe_in(dir.path()).beeper_available().await);
    }

    #[tokio::test]
    async fn test_beeper_unavailable_without_module_list() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!probe_in(dir.path()).beeper_available().await);
    }

    #[tokio::test]
    async fn test_audio_available_from_kernel_cards() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cards"), ASOUND_CARDS).unwrap();
        assert!(probe_in(dir.path()).audio_available().await);
    }

    #[test]
    fn test_sysfs_cards() {
        let dir = tempfile::tempdir().unwrap();
        let probe = probe_in(dir.path());
        assert!(!probe.sysfs_lists_cards());

        fs::create_dir_all(dir.path().join("sound").join("card0")).unwrap();
        assert!(probe.sysfs_lists_cards());
    }

    #[test]
    fn test_pcspkr_parent_dir_counts() {
        let dir = tempfile::tempdir().unwrap();
        let probe = probe_in(dir.path());
        assert!(!probe.pcspkr_device_present());

        fs::create_dir_all(dir.path().join("input")).unwrap();
        assert!(probe.pcspkr_device_present());
    }
}
