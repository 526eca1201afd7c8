//! Output arbitration and tone/file dispatch
//!
//! The output mode is resolved on every call from a fresh hardware probe, so
//! hardware that appears or disappears is picked up immediately and random
//! mode draws are independent per tone.

use rand::Rng;
use std::path::Path;
use tracing::{debug, trace};

use crate::backend::{
    default_players, first_success, BeepCommand, FilePlayer, SoxAplaySynth, ToneEmitter, ToneSynth,
};
use crate::config::Settings;
use crate::constants::{hardware, tone};
use crate::hardware::{HardwareProbe, SystemProbe};
use crate::types::{BeepSpec, OutputMode, RequestedMode};

/// Resolve the output for one emission
pub fn resolve<R: Rng + ?Sized>(
    requested: &RequestedMode,
    beeper: bool,
    audio: bool,
    random_audio_percent: u8,
    rng: &mut R,
) -> OutputMode {
    let first_available = |preferred: (bool, OutputMode), other: (bool, OutputMode)| {
        if preferred.0 {
            preferred.1
        } else if other.0 {
            other.1
        } else {
            OutputMode::None
        }
    };

    match requested {
        RequestedMode::Pcspkr => {
            first_available((beeper, OutputMode::Pcspkr), (audio, OutputMode::Audio))
        }
        RequestedMode::Audio => {
            first_available((audio, OutputMode::Audio), (beeper, OutputMode::Pcspkr))
        }
        RequestedMode::Random if beeper && audio => {
            if rng.gen_range(0..100u8) < random_audio_percent {
                OutputMode::Audio
            } else {
                OutputMode::Pcspkr
            }
        }
        RequestedMode::Random => {
            first_available((audio, OutputMode::Audio), (beeper, OutputMode::Pcspkr))
        }
        RequestedMode::Other(_) => OutputMode::None,
    }
}

/// Hardware probe plus the backends it arbitrates between
pub struct SoundOutput<P> {
    probe: P,
    beeper: Box<dyn ToneEmitter>,
    synth: Box<dyn ToneSynth>,
    players: Vec<Box<dyn FilePlayer>>,
}

impl SoundOutput<SystemProbe> {
    /// Real hardware probe with `beep`, `sox | aplay` and the player chain
    pub fn system() -> Self {
        Self::new(
            SystemProbe::new(),
            Box::new(BeepCommand),
            Box::new(SoxAplaySynth),
            default_players(),
        )
    }
}

impl<P: HardwareProbe> SoundOutput<P> {
    pub fn new(
        probe: P,
        beeper: Box<dyn ToneEmitter>,
        synth: Box<dyn ToneSynth>,
        players: Vec<Box<dyn FilePlayer>>,
    ) -> Self {
        Self {
            probe,
            beeper,
            synth,
            players,
        }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Probe hardware and resolve the output for this call
    pub async fn pick_mode<R: Rng + ?Sized>(&self, settings: &Settings, rng: &mut R) -> OutputMode {
        let beeper = self.probe.beeper_available().await;
        let audio = self.probe.audio_available().await;
        let mode = resolve(
            &settings.output_mode,
            beeper,
            audio,
            settings.random_audio_percent,
            rng,
        );
        trace!(requested = %settings.output_mode, beeper, audio, mode = %mode, "Resolved output mode");
        mode
    }

    /// Play one tone on whichever output resolves. Returns false when
    /// nothing could play it; never fails otherwise.
    pub async fn play_tone<R: Rng + ?Sized>(
        &self,
        settings: &Settings,
        beep: BeepSpec,
        rng: &mut R,
    ) -> bool {
        match self.pick_mode(settings, rng).await {
            OutputMode::Pcspkr => self.beep(beep).await || self.synthesize(settings, beep).await,
            OutputMode::Audio => self.synthesize(settings, beep).await,
            OutputMode::None => false,
        }
    }

    /// PC speaker only
    pub async fn beep(&self, beep: BeepSpec) -> bool {
        match self.beeper.emit_tone(beep.freq_hz, beep.duration_ms).await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, freq = beep.freq_hz, "Beeper failed");
                false
            }
        }
    }

    /// Device name to use for digital audio this call
    pub async fn audio_device(&self, settings: &Settings) -> String {
        if settings.audio.wants_autodetect() {
            self.probe
                .detect_audio_device()
                .await
                .unwrap_or_else(|| hardware::DEFAULT_DEVICE.to_string())
        } else {
            settings.audio.device.clone()
        }
    }

    /// Digital audio only, trying pipewire, the configured device, then `default`
    pub async fn synthesize(&self, settings: &Settings, beep: BeepSpec) -> bool {
        if !self.probe.audio_available().await {
            return false;
        }

        let seconds = f64::from(beep.duration_ms.max(tone::MIN_AUDIO_MS)) / 1000.0;
        let device = self.audio_device(settings).await;
        let candidates = device_chain(&device);
        let audio = &settings.audio;

        let played = first_success(candidates.iter().map(String::as_str), |dev| {
            self.synth
                .synthesize_tone(beep.freq_hz, seconds, audio.gain, dev, &audio.limiter)
        })
        .await;

        if played.is_none() {
            debug!(freq = beep.freq_hz, "No audio device accepted the tone");
        }
        played.is_some()
    }

    /// Try each file player in order
    pub async fn play_file(&self, settings: &Settings, path: &Path, limit_seconds: u32) -> bool {
        let device = self.audio_device(settings).await;
        let gain = settings.audio.gain;

        match first_success(self.players.iter().map(|p| p.as_ref()), |player| {
            player.play_file(path, limit_seconds, &device, gain)
        })
        .await
        {
            Some(player) => {
                debug!(player = player.name(), path = %path.display(), "Played sound file");
                true
            }
            None => {
                debug!(path = %path.display(), "Every file player failed");
                false
            }
        }
    }
}

/// `pipewire`, the chosen device, then `default`, without repeats
fn device_chain(device: &str) -> Vec<String> {
    let mut chain: Vec<String> = Vec::with_capacity(3);
    for candidate in ["pipewire", device, hardware::DEFAULT_DEVICE] {
        if !chain.iter().any(|c| c == candidate) {
            chain.push(candidate.to_string());
        }
    }
    chain
}
