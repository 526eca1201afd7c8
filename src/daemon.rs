//! Daemon startup: run-directory defaults, signal handling, hardware report

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{ConfigStore, FileDaemonState, Paths};
use crate::hardware::HardwareProbe;
use crate::output::SoundOutput;
use crate::quiet_hours::LocalClock;
use crate::scheduler::Scheduler;
use crate::sound_files::SoundFilePlayer;

/// What the host offers, as logged at startup and printed by `detect`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareReport {
    pub beeper: bool,
    pub audio: bool,
    pub device: Option<String>,
}

impl HardwareReport {
    pub async fn probe<P: HardwareProbe>(probe: &P) -> Self {
        let beeper = probe.beeper_available().await;
        let audio = probe.audio_available().await;
        let device = if audio {
            probe.detect_audio_device().await
        } else {
            None
        };
        Self { beeper, audio, device }
    }

    pub fn log(&self) {
        info!("PC Speaker/Piezo: {}", availability(self.beeper));
        info!("Audio Hardware: {}", availability(self.audio));
        if let Some(device) = &self.device {
            info!(device = %device, "Audio Device: {device}");
        }
    }
}

pub fn availability(available: bool) -> &'static str {
    if available { "Available" } else { "Not available" }
}

/// Exit the process on SIGTERM/SIGINT from a dedicated thread
#[cfg(unix)]
fn install_signal_exit() -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGTERM, SIGINT]).context("Failed to register signal handlers")?;
    std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!(signal, "Termination signal received, exiting");
                std::process::exit(0);
            }
        })
        .context("Failed to spawn signal thread")?;
    Ok(())
}

#[cfg(not(unix))]
fn install_signal_exit() -> Result<()> {
    Ok(())
}

/// Start the daemon loop on a current-thread runtime. Only returns on a
/// startup error.
pub fn run(paths: &Paths) -> Result<()> {
    install_signal_exit()?;

    let state = FileDaemonState::new(&paths.run_dir);
    state.ensure_defaults();

    info!(
        config = %paths.config_file.display(),
        run_dir = %paths.run_dir.display(),
        "Starting retro-sfx daemon"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;

    runtime.block_on(async {
        let output = SoundOutput::system();
        HardwareReport::probe(output.probe()).await.log();

        let mut scheduler = Scheduler::new(
            ConfigStore::new(&paths.config_file),
            state,
            output,
            SoundFilePlayer::new(),
            LocalClock,
        );
        scheduler.run().await;
    });

    Ok(())
}
