//! The daemon loop
//!
//! Each tick takes a fresh settings snapshot and daemon state, consults the
//! quiet-hours gate, then plays either a sound file or one pattern of the
//! active profile and sleeps. Nothing here can fail; backends that do are
//! skipped.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::{DaemonState, Settings, SettingsSource};
use crate::constants::{sounds, timing};
use crate::hardware::HardwareProbe;
use crate::output::SoundOutput;
use crate::patterns::{self, Pattern};
use crate::quiet_hours::{is_quiet, Clock};
use crate::sound_files::{FileOutcome, SoundFilePlayer};
use crate::types::{PatternStyle, Profile};

/// What a single tick ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Disabled or quiet; slept the idle period
    Idle,
    SoundFile(FileOutcome),
    Pattern { profile: Profile, variation: usize },
}

pub struct Scheduler<S, D, P, C> {
    settings: S,
    state: D,
    output: SoundOutput<P>,
    sound_files: SoundFilePlayer,
    clock: C,
    rng: StdRng,
}

impl<S, D, P, C> Scheduler<S, D, P, C>
where
    S: SettingsSource,
    D: DaemonState,
    P: HardwareProbe,
    C: Clock,
{
    pub fn new(
        settings: S,
        state: D,
        output: SoundOutput<P>,
        sound_files: SoundFilePlayer,
        clock: C,
    ) -> Self {
        Self {
            settings,
            state,
            output,
            sound_files,
            clock,
            rng: StdRng::from_entropy(),
        }
    }

    #[cfg(test)]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Loop forever; the process ends on a termination signal
    pub async fn run(&mut self) {
        info!("Scheduler started");
        loop {
            let tick = self.tick().await;
            debug!(?tick, "Tick finished");
        }
    }

    pub async fn tick(&mut self) -> Tick {
        let settings = self.settings.load();

        if !self.state.is_enabled() || is_quiet(&settings, self.clock.now()) {
            tokio::time::sleep(timing::IDLE_SLEEP).await;
            return Tick::Idle;
        }

        if settings.sounds.enabled
            && self.rng.gen_ratio(1, sounds::FILE_CHANCE_DENOMINATOR)
        {
            let outcome = self
                .sound_files
                .run(&settings, &self.output, &mut self.rng)
                .await;
            return Tick::SoundFile(outcome);
        }

        let profile = self.state.current_profile();
        let variation = self.play_profile(&settings, profile).await;

        let pause = patterns::interval(settings.profile(profile).interval_minutes, &mut self.rng);
        debug!(profile = %profile, seconds = pause.as_secs(), "Sleeping after pattern");
        tokio::time::sleep(pause).await;

        Tick::Pattern { profile, variation }
    }

    /// Play one pattern for `profile` and return the variation used
    async fn play_profile(&mut self, settings: &Settings, profile: Profile) -> usize {
        let (variation, pattern) =
            patterns::select_pattern(profile, settings.enabled_variations(profile), &mut self.rng);
        debug!(profile = %profile, variation, "Playing pattern");

        match profile.style() {
            PatternStyle::Chatty => self.play_chatty(settings, profile, pattern).await,
            PatternStyle::Ambient => self.play_ambient(settings, pattern).await,
        }
        variation
    }

    async fn play_chatty(&mut self, settings: &Settings, profile: Profile, pattern: Pattern) {
        let count = patterns::beep_count(settings.profile(profile).beeps, &mut self.rng);
        for beep in patterns::beep_sequence(pattern, count, &mut self.rng) {
            let beep = patterns::jitter(beep, &mut self.rng);
            self.output.play_tone(settings, beep, &mut self.rng).await;
            tokio::time::sleep(patterns::beep_pause(&mut self.rng)).await;
        }
    }

    async fn play_ambient(&mut self, settings: &Settings, pattern: Pattern) {
        for &beep in pattern {
            if beep.is_rest() {
                tokio::time::sleep(std::time::Duration::from_millis(u64::from(beep.duration_ms))).await;
            } else {
                self.output.play_tone(settings, beep, &mut self.rng).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::testing::{fake_output, Log};
    use crate::types::BeepSpec;
    use chrono::NaiveTime;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tokio::time::Instant;

    struct StaticSettings(Settings);

    impl SettingsSource for StaticSettings {
        fn load(&self) -> Settings {
            self.0.clone()
        }
    }

    struct StaticState {
        enabled: bool,
        profile: Profile,
    }

    impl DaemonState for StaticState {
        fn is_enabled(&self) -> bool {
            self.enabled
        }
        fn current_profile(&self) -> Profile {
            self.profile
        }
    }

    struct FixedClock(NaiveTime);

    impl Clock for FixedClock {
        fn now(&self) -> NaiveTime {
            self.0
        }
    }

    fn noon() -> FixedClock {
        FixedClock(NaiveTime::from_hms_opt(12, 0, 0).unwrap())
    }

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_map(&map)
    }

    fn scheduler(
        settings: Settings,
        enabled: bool,
        profile: Profile,
        hardware: (bool, bool),
        clock: FixedClock,
    ) -> (
        Scheduler<StaticSettings, StaticState, crate::output::testing::FakeProbe, FixedClock>,
        Log,
    ) {
        let (output, log) = fake_output(hardware.0, hardware.1, [true, true]);
        let scheduler = Scheduler::new(
            StaticSettings(settings),
            StaticState { enabled, profile },
            output,
            SoundFilePlayer::with_colocated_dir(None),
            clock,
        )
        .with_rng(StdRng::seed_from_u64(11));
        (scheduler, log)
    }

    /// Paused-clock sleeps may round up to the next millisecond
    fn assert_slept(elapsed: Duration, expected: Duration) {
        assert!(
            elapsed >= expected && elapsed <= expected + Duration::from_millis(10),
            "slept {elapsed:?}, expected {expected:?}"
        );
    }

    fn tones(log: &Log) -> usize {
        let calls = log.lock().unwrap();
        calls.beeps.len() + calls.synth.len()
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_idles() {
        let (mut s, log) = scheduler(Settings::default(), false, Profile::Wopr, (true, true), noon());
        let start = Instant::now();
        assert_eq!(s.tick().await, Tick::Idle);
        assert_slept(start.elapsed(), timing::IDLE_SLEEP);
        assert_eq!(tones(&log), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_hours_idle() {
        let late = FixedClock(NaiveTime::from_hms_opt(23, 30, 0).unwrap());
        let (mut s, log) = scheduler(Settings::default(), true, Profile::Wopr, (true, true), late);
        assert_eq!(s.tick().await, Tick::Idle);
        assert_eq!(tones(&log), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_hours_disabled_plays() {
        let late = FixedClock(NaiveTime::from_hms_opt(23, 30, 0).unwrap());
        let cfg = settings(&[("QUIET_ENABLED", "0")]);
        let (mut s, _log) = scheduler(cfg, true, Profile::Mainframe, (true, true), late);
        assert!(matches!(s.tick().await, Tick::Pattern { profile: Profile::Mainframe, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_chatty_pattern_within_bounds() {
        let cfg = settings(&[
            ("OUTPUT_MODE", "pcspkr"),
            ("WOPR_BEEPS_MIN", "2"),
            ("WOPR_BEEPS_MAX", "3"),
            ("WOPR_INTERVAL_MIN", "2"),
            ("WOPR_INTERVAL_MAX", "4"),
            ("WOPR_ENABLED_VARIATIONS", "0"),
        ]);
        let (mut s, log) = scheduler(cfg, true, Profile::Wopr, (true, false), noon());

        for _ in 0..20 {
            let start = Instant::now();
            let tick = s.tick().await;
            assert_eq!(tick, Tick::Pattern { profile: Profile::Wopr, variation: 0 });
            let elapsed = start.elapsed();
            // Interval plus at most 3 pauses of 0.4 s
            assert!(elapsed >= Duration::from_secs(120), "{elapsed:?}");
            assert!(elapsed <= Duration::from_secs(240) + Duration::from_millis(1200), "{elapsed:?}");
        }

        let calls = log.lock().unwrap();
        assert!((40..=60).contains(&calls.beeps.len()));
        for beep in &calls.beeps {
            assert!((100..=3000).contains(&beep.freq_hz));
            assert!((10..=800).contains(&beep.duration_ms));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ambient_pattern_plays_verbatim_and_sleeps_rests() {
        // Modem variation 2: 440 Hz, 400 ms rest, 440 Hz
        let cfg = settings(&[
            ("OUTPUT_MODE", "pcspkr"),
            ("MODEM_ENABLED_VARIATIONS", "2"),
            ("MODEM_INTERVAL_MIN", "1"),
            ("MODEM_INTERVAL_MAX", "1"),
        ]);
        let (mut s, log) = scheduler(cfg, true, Profile::Modem, (true, false), noon());
        let start = Instant::now();

        assert_eq!(s.tick().await, Tick::Pattern { profile: Profile::Modem, variation: 2 });
        assert_slept(start.elapsed(), Duration::from_millis(60_400));
        assert_eq!(
            log.lock().unwrap().beeps,
            vec![BeepSpec::new(440, 400), BeepSpec::new(440, 400)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_hardware_still_sleeps_interval() {
        let cfg = settings(&[("MAINFRAME_INTERVAL_MIN", "1"), ("MAINFRAME_INTERVAL_MAX", "1")]);
        let (mut s, log) = scheduler(cfg, true, Profile::Mainframe, (false, false), noon());
        let start = Instant::now();

        assert!(matches!(s.tick().await, Tick::Pattern { .. }));
        assert_slept(start.elapsed(), Duration::from_secs(60));
        assert_eq!(tones(&log), 0);
    }

    fn sound_dir_with_file() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("beep.ogg"), b"OggS").unwrap();
        dir
    }

    fn sounds_cfg(dir: &Path, enabled: &str) -> Settings {
        settings(&[
            ("SOUNDS_ENABLED", enabled),
            ("SOUNDS_DIR", &dir.display().to_string()),
            ("ALIENSTERM_INTERVAL_MIN", "1"),
            ("ALIENSTERM_INTERVAL_MAX", "1"),
        ])
    }

    #[tokio::test(start_paused = true)]
    async fn test_sound_files_chosen_occasionally() {
        let dir = sound_dir_with_file();
        let (mut s, log) =
            scheduler(sounds_cfg(dir.path(), "1"), true, Profile::Aliensterm, (false, true), noon());

        let mut files = 0;
        for _ in 0..300 {
            if let Tick::SoundFile(outcome) = s.tick().await {
                assert!(matches!(outcome, FileOutcome::Played(_)));
                files += 1;
            }
        }
        // Expect about 30 of 300
        assert!((10..=60).contains(&files), "{files}");
        assert_eq!(log.lock().unwrap().files.len(), files);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sound_files_disabled_never_selected() {
        let dir = sound_dir_with_file();
        let (mut s, log) =
            scheduler(sounds_cfg(dir.path(), "0"), true, Profile::Aliensterm, (false, true), noon());

        for _ in 0..300 {
            let start = Instant::now();
            let tick = s.tick().await;
            assert!(matches!(tick, Tick::Pattern { profile: Profile::Aliensterm, .. }));
            // Only the pattern interval, never a sound-file interval
            assert!(start.elapsed() < Duration::from_secs(61));
        }
        assert!(log.lock().unwrap().files.is_empty());
    }
}
