//! Command line: the daemon entry point plus runtime control commands

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    Bounds, ConfigStore, DaemonState, FileDaemonState, Paths, ProfileSettings, Settings,
    SettingsSource, VariationSet,
};
use crate::constants::{timing, validation};
use crate::daemon::{self, availability, HardwareReport};
use crate::hardware::HardwareProbe;
use crate::output::SoundOutput;
use crate::quiet_hours::{format_hhmm, parse_hhmm};
use crate::sound_files::pseudo_beeps;
use crate::types::Profile;

/// Retro SFX - ambient computer beeps for PC speakers and sound cards
#[derive(Debug, Parser)]
#[command(name = "retro-sfx", version, about)]
pub struct Cli {
    /// Use per-user config and run directories instead of /etc and /run
    #[arg(long, global = true)]
    pub user: bool,

    /// Config file path
    #[arg(long, global = true, env = "RETRO_SFX_CONF")]
    pub config: Option<PathBuf>,

    /// Run directory holding the enabled/profile flag files
    #[arg(long, global = true, env = "RETRO_SFX_RUNDIR")]
    pub run_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    fn flag(self) -> &'static str {
        match self {
            Switch::On => "1",
            Switch::Off => "0",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    Pcspkr,
    Audio,
    Random,
}

impl OutputArg {
    fn as_str(self) -> &'static str {
        match self {
            OutputArg::Pcspkr => "pcspkr",
            OutputArg::Audio => "audio",
            OutputArg::Random => "random",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the sound daemon
    Run,
    /// Show daemon state and settings
    Status {
        /// Print the settings snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Enable sounds
    On,
    /// Disable sounds
    Off,
    /// Set the sound profile
    Profile { name: Profile },
    /// Set the output mode
    Output { mode: OutputArg },
    /// Percentage of tones sent to the sound card in random mode
    RandomAudio {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
    /// Enable or disable the audio limiter
    Limiter { state: Switch },
    /// Enable or disable quiet hours
    Quiet { state: Switch },
    /// Set quiet hours (24-hour HH:MM)
    QuietTime {
        #[arg(value_parser = parse_time)]
        start: String,
        #[arg(value_parser = parse_time)]
        end: String,
    },
    /// Set enabled variations for a profile: "all" or a list like "0,1,2"
    Variations {
        profile: Profile,
        #[arg(value_parser = parse_variations)]
        variations: String,
    },
    /// Set a profile's pause between patterns, in minutes
    Interval {
        profile: Profile,
        #[arg(value_parser = clap::value_parser!(u32).range(1..=100))]
        min: u32,
        #[arg(value_parser = clap::value_parser!(u32).range(1..=100))]
        max: u32,
    },
    /// Set how many beeps a chatty profile plays per pattern
    Beeps {
        profile: Profile,
        #[arg(value_parser = clap::value_parser!(u32).range(1..=20))]
        min: u32,
        #[arg(value_parser = clap::value_parser!(u32).range(1..=20))]
        max: u32,
    },
    /// Enable or disable occasional sound-file playback
    Sounds { state: Switch },
    /// Set the sound-file directory
    SoundsDir { path: PathBuf },
    /// Report PC speaker and audio hardware
    Detect,
    /// Print and play the beep sequence a sound file maps to
    Preview {
        file: PathBuf,
        /// Seconds of sound to approximate
        #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..=30))]
        duration: u32,
    },
}

fn parse_time(value: &str) -> Result<String, String> {
    parse_hhmm(value)
        .map(format_hhmm)
        .ok_or_else(|| format!("invalid time '{value}', use HH:MM (24-hour)"))
}

/// Stricter than the daemon's reading: reject anything it would silently drop
fn parse_variations(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("all") {
        return Ok("all".to_string());
    }

    let mut indices = Vec::new();
    for part in value.split(',') {
        let n: u8 = part
            .trim()
            .parse()
            .map_err(|_| format!("invalid variations '{value}', use 'all' or a list like '0,1,2,3'"))?;
        if n > validation::MAX_VARIATION {
            return Err(format!("variation numbers must be 0-{}", validation::MAX_VARIATION));
        }
        indices.push(n.to_string());
    }
    Ok(indices.join(","))
}

fn ensure_ordered(min: u32, max: u32) {
    if min > max {
        Cli::command()
            .error(
                ErrorKind::ValueValidation,
                format!("min ({min}) must not exceed max ({max})"),
            )
            .exit();
    }
}

pub fn execute(cli: Cli) -> Result<()> {
    let paths = Paths::resolve(cli.user, cli.config, cli.run_dir)?;
    let store = ConfigStore::new(&paths.config_file);
    let state = FileDaemonState::new(&paths.run_dir);

    match cli.command {
        Command::Run => daemon::run(&paths),
        Command::Status { json } => status(&store, &state, json),
        Command::On => state.set_enabled(true),
        Command::Off => state.set_enabled(false),
        Command::Profile { name } => state.set_profile(name),
        Command::Output { mode } => store.set("OUTPUT_MODE", mode.as_str()),
        Command::RandomAudio { percent } => store.set("RANDOM_AUDIO_PERCENT", &percent.to_string()),
        Command::Limiter { state } => store.set("LIMITER_ENABLED", state.flag()),
        Command::Quiet { state } => store.set("QUIET_ENABLED", state.flag()),
        Command::QuietTime { start, end } => {
            store.set("QUIET_START", &format!("\"{start}\""))?;
            store.set("QUIET_END", &format!("\"{end}\""))
        }
        Command::Variations { profile, variations } => store.set(
            &format!("{}_ENABLED_VARIATIONS", profile.config_prefix()),
            &variations,
        ),
        Command::Interval { profile, min, max } => {
            ensure_ordered(min, max);
            set_bounds(&store, profile, "INTERVAL", min, max)
        }
        Command::Beeps { profile, min, max } => {
            ensure_ordered(min, max);
            set_bounds(&store, profile, "BEEPS", min, max)
        }
        Command::Sounds { state } => store.set("SOUNDS_ENABLED", state.flag()),
        Command::SoundsDir { path } => store.set("SOUNDS_DIR", &path.display().to_string()),
        Command::Detect => block_on(detect()),
        Command::Preview { file, duration } => block_on(preview(&store, &file, duration)),
    }
}

fn set_bounds(store: &ConfigStore, profile: Profile, what: &str, min: u32, max: u32) -> Result<()> {
    let prefix = profile.config_prefix();
    store.set(&format!("{prefix}_{what}_MIN"), &min.to_string())?;
    store.set(&format!("{prefix}_{what}_MAX"), &max.to_string())
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?
        .block_on(future)
}

#[derive(Serialize)]
struct Status<'a> {
    enabled: bool,
    profile: Profile,
    #[serde(flatten)]
    settings: &'a Settings,
}

fn status(store: &ConfigStore, state: &FileDaemonState, json: bool) -> Result<()> {
    let settings = SettingsSource::load(store);
    let enabled = state.is_enabled();
    let profile = state.current_profile();

    if json {
        let status = Status {
            enabled,
            profile,
            settings: &settings,
        };
        let text = serde_json::to_string_pretty(&status).context("Failed to serialize status")?;
        println!("{text}");
    } else {
        print!("{}", status_text(enabled, profile, &settings));
    }
    Ok(())
}

fn variations_text(set: &VariationSet) -> String {
    if set.is_all() {
        "all".to_string()
    } else {
        set.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",")
    }
}

fn range_text(bounds: Bounds) -> String {
    format!("{}-{}", bounds.min, bounds.max)
}

fn status_text(enabled: bool, profile: Profile, settings: &Settings) -> String {
    let mut out = format!(
        "enabled={} profile={profile} output={} random_audio_percent={} limiter={}\n",
        u8::from(enabled),
        settings.output_mode,
        settings.random_audio_percent,
        u8::from(settings.audio.limiter.enabled),
    );
    out += &format!(
        "quiet_enabled={} quiet_start={} quiet_end={}\n",
        u8::from(settings.quiet.enabled),
        format_hhmm(settings.quiet.window.start),
        format_hhmm(settings.quiet.window.end),
    );
    for p in Profile::ALL {
        let ProfileSettings {
            variations,
            interval_minutes,
            beeps,
        } = settings.profile(p);
        out += &format!(
            "{p}: variations={} interval={}min beeps={}\n",
            variations_text(variations),
            range_text(*interval_minutes),
            range_text(*beeps),
        );
    }
    let sounds = &settings.sounds;
    out += &format!(
        "sounds_enabled={} sounds_dir={} duration={}s interval={}min\n",
        u8::from(sounds.enabled),
        sounds.dir.display(),
        range_text(sounds.duration_seconds),
        range_text(sounds.interval_minutes),
    );
    out
}

async fn detect() -> Result<()> {
    let output = SoundOutput::system();
    let report = HardwareReport::probe(output.probe()).await;
    println!("PC Speaker/Piezo: {}", availability(report.beeper));
    println!("Audio Hardware: {}", availability(report.audio));
    if let Some(device) = report.device {
        println!("Audio Device: {device}");
    }
    Ok(())
}

async fn preview(store: &ConfigStore, file: &std::path::Path, duration: u32) -> Result<()> {
    let settings = SettingsSource::load(store);
    let beeps = pseudo_beeps(file, duration);

    println!("{} -> {} beeps", file.display(), beeps.len());
    for (i, beep) in beeps.iter().enumerate() {
        println!("{:2}: {:4} Hz {:3} ms", i + 1, beep.freq_hz, beep.duration_ms);
    }

    let output = SoundOutput::system();
    if !output.probe().audio_available().await {
        println!("No audio hardware; not playing");
        return Ok(());
    }

    let pause = Duration::from_millis(timing::PSEUDO_BEEP_PAUSE_MS);
    for beep in beeps {
        output.synthesize(&settings, beep).await;
        tokio::time::sleep(pause).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("retro-sfx").chain(args.iter().copied()))
    }

    fn in_dir(dir: &std::path::Path, args: &[&str]) -> Cli {
        let config = dir.join("retro-sfx.conf");
        let run = dir.join("run");
        let mut full = vec![
            "--config".to_string(),
            config.display().to_string(),
            "--run-dir".to_string(),
            run.display().to_string(),
        ];
        full.extend(args.iter().map(|s| s.to_string()));
        Cli::try_parse_from(std::iter::once("retro-sfx".to_string()).chain(full)).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(parse(&["profile", "c64"]).is_err());
        assert!(parse(&["output", "hdmi"]).is_err());
        assert!(parse(&["random-audio", "101"]).is_err());
        assert!(parse(&["quiet-time", "25:00", "07:00"]).is_err());
        assert!(parse(&["variations", "wopr", "1,12"]).is_err());
        assert!(parse(&["variations", "wopr", "a,b"]).is_err());
        assert!(parse(&["interval", "modem", "0", "5"]).is_err());
        assert!(parse(&["beeps", "wopr", "1", "21"]).is_err());
        assert!(parse(&["preview", "x.wav", "--duration", "31"]).is_err());
    }

    #[test]
    fn test_accepts_modem_profile() {
        let cli = parse(&["profile", "modem"]).unwrap();
        assert!(matches!(cli.command, Command::Profile { name: Profile::Modem }));
    }

    #[test]
    fn test_parse_variations_normalizes() {
        assert_eq!(parse_variations("ALL"), Ok("all".to_string()));
        assert_eq!(parse_variations(" 0, 3 ,9"), Ok("0,3,9".to_string()));
        assert!(parse_variations("").is_err());
    }

    #[test]
    fn test_parse_time_normalizes() {
        assert_eq!(parse_time("7:05"), Ok("07:05".to_string()));
        assert!(parse_time("12:60").is_err());
    }

    #[test]
    fn test_commands_write_config_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        for args in [
            &["output", "audio"][..],
            &["random-audio", "35"],
            &["quiet-time", "23:15", "06:45"],
            &["variations", "wopr", "2,5"],
            &["interval", "modem", "4", "9"],
            &["sounds", "on"],
            &["off"],
            &["profile", "aliensterm"],
        ] {
            execute(in_dir(dir.path(), args)).unwrap();
        }

        let conf = fs::read_to_string(dir.path().join("retro-sfx.conf")).unwrap();
        assert!(conf.contains("QUIET_START=\"23:15\""));

        let settings = SettingsSource::load(&ConfigStore::new(dir.path().join("retro-sfx.conf")));
        assert_eq!(settings.output_mode.to_string(), "audio");
        assert_eq!(settings.random_audio_percent, 35);
        assert_eq!(format_hhmm(settings.quiet.window.end), "06:45");
        assert_eq!(variations_text(&settings.wopr.variations), "2,5");
        assert_eq!(settings.modem.interval_minutes, Bounds::new(4, 9));
        assert!(settings.sounds.enabled);

        let state = FileDaemonState::new(dir.path().join("run"));
        assert!(!state.is_enabled());
        assert_eq!(state.current_profile(), Profile::Aliensterm);
    }

    #[test]
    fn test_status_text_defaults() {
        let text = status_text(true, Profile::Mainframe, &Settings::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "enabled=1 profile=mainframe output=random random_audio_percent=70 limiter=0"
        );
        assert_eq!(lines[1], "quiet_enabled=1 quiet_start=22:00 quiet_end=07:00");
        assert_eq!(lines[2], "mainframe: variations=all interval=1-3min beeps=1-6");
        assert_eq!(lines[5], "modem: variations=all interval=3-10min beeps=1-6");
        assert!(lines[6].starts_with("sounds_enabled=0 sounds_dir=/usr/share/retro-sfx/sounds"));
    }

    #[test]
    fn test_status_json_shape() {
        let settings = Settings::default();
        let status = Status {
            enabled: false,
            profile: Profile::Wopr,
            settings: &settings,
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["enabled"], false);
        assert_eq!(value["profile"], "wopr");
        assert_eq!(value["output_mode"], "random");
        assert_eq!(value["quiet"]["window"]["start"], "22:00");
    }
}
