//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Filesystem locations used in system mode
pub mod paths {
    /// System-wide config file
    pub const SYSTEM_CONFIG: &str = "/etc/retro-sfx.conf";

    /// Runtime directory holding the enabled/profile flag files
    pub const SYSTEM_RUN_DIR: &str = "/run/retro-sfx";

    /// Application directory name under XDG config/runtime dirs (user mode)
    pub const APP_DIR: &str = "retro-sfx";

    /// Config filename under the user config dir
    pub const CONFIG_FILENAME: &str = "retro-sfx.conf";

    /// Flag file containing "1" or "0"
    pub const ENABLED_FILE: &str = "enabled";

    /// Flag file containing the active profile name
    pub const PROFILE_FILE: &str = "profile";

    /// Sound directory name looked up next to the executable
    pub const COLOCATED_SOUNDS_DIR: &str = "sounds";
}

/// Host probing locations and labels
pub mod hardware {
    /// Kernel module list (what `lsmod` reads)
    pub const PROC_MODULES: &str = "/proc/modules";

    /// Kernel module that drives the PC speaker
    pub const PCSPKR_MODULE: &str = "pcspkr";

    /// Device nodes created for the PC speaker input device
    pub const PCSPKR_PATHS: &[&str] = &[
        "/dev/input/by-path/platform-pcspkr-event-spkr",
        "/dev/input/by-path/platform-pcspkr",
    ];

    /// ALSA sound card listing
    pub const ASOUND_CARDS: &str = "/proc/asound/cards";

    /// Sysfs sound class directory (USB audio shows up here too)
    pub const SYS_SOUND_DIR: &str = "/sys/class/sound";

    /// Software mixer servers tried before hardware cards
    pub const MIXER_DEVICES: &[&str] = &["pipewire", "pulse"];

    /// Card labels that identify an analog output in `aplay -l`
    pub const ANALOG_LABELS: &[&str] = &["HDA Analog", "Analog"];

    /// Fallback ALSA device name
    pub const DEFAULT_DEVICE: &str = "default";
}

/// External program names
pub mod programs {
    pub const BEEP: &str = "beep";
    pub const SOX: &str = "sox";
    pub const APLAY: &str = "aplay";
    pub const MPV: &str = "mpv";
    pub const FFPLAY: &str = "ffplay";
    pub const SOX_PLAY: &str = "play";
    pub const PAPLAY: &str = "paplay";
}

/// Upper bounds on external calls and fixed pauses
pub mod timing {
    use std::time::Duration;

    /// Device enumeration probe (`aplay -l`, `aplay -D dev -l`)
    pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

    /// Single `beep` invocation
    pub const BEEP_TIMEOUT: Duration = Duration::from_secs(1);

    /// Single synthesized tone (sox piped into aplay)
    pub const SYNTH_TIMEOUT: Duration = Duration::from_secs(2);

    /// Extra time a file player gets on top of the requested play duration
    pub const PLAYER_GRACE: Duration = Duration::from_secs(2);

    /// Sleep while disabled or inside quiet hours
    pub const IDLE_SLEEP: Duration = Duration::from_secs(2);

    /// Pause between pseudo-beeps derived from a sound file
    pub const PSEUDO_BEEP_PAUSE_MS: u64 = 50;

    /// Pause between jittered beeps (seconds)
    pub const BEEP_PAUSE_MIN_SECS: f64 = 0.05;
    pub const BEEP_PAUSE_MAX_SECS: f64 = 0.4;
}

/// Tone shaping limits
pub mod tone {
    /// Shortest tone sent to the digital audio path (shorter clicks are inaudible)
    pub const MIN_AUDIO_MS: u32 = 30;

    /// Frequency jitter range in Hz (symmetric)
    pub const FREQ_JITTER_HZ: i32 = 200;
    pub const MIN_FREQ_HZ: i32 = 100;
    pub const MAX_FREQ_HZ: i32 = 3000;

    /// Duration jitter multiplier range
    pub const DUR_MULT_MIN: f64 = 0.2;
    pub const DUR_MULT_MAX: f64 = 5.0;
    pub const MIN_DUR_MS: u32 = 10;
    pub const MAX_DUR_MS: u32 = 800;

    /// Number of times a multi-beep pattern is replicated before sampling
    pub const REPLICATION: usize = 3;

    /// Sample rate and format handed to sox
    pub const SAMPLE_RATE: &str = "44100";
    pub const CHANNELS: &str = "2";
    pub const BITS: &str = "16";
}

/// Pseudo-beep derivation for sound files
pub mod pseudo {
    pub const MIN_BEEPS: usize = 5;
    pub const MAX_BEEPS: usize = 15;
    pub const MIN_FREQ_HZ: u32 = 200;
    pub const FREQ_SPAN_HZ: u32 = 1800;
    pub const MIN_DUR_MS: u32 = 50;
    pub const MAX_DUR_MS: u32 = 200;
    pub const DUR_MODULUS: u32 = 150;
}

/// Sound file playback
pub mod sounds {
    /// Default sound directory
    pub const DEFAULT_DIR: &str = "/usr/share/retro-sfx/sounds";

    /// Accepted audio file extensions (lowercase)
    pub const EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a", "aac", "opus"];

    /// One tick in this many plays a sound file when enabled
    pub const FILE_CHANCE_DENOMINATOR: u32 = 10;
}

/// Validation limits applied when the settings snapshot is built
pub mod validation {
    pub const MIN_INTERVAL_MINUTES: u32 = 1;
    pub const MAX_INTERVAL_MINUTES: u32 = 100;

    pub const MIN_BEEPS: u32 = 1;
    pub const MAX_BEEPS: u32 = 20;

    pub const MIN_SOUND_SECONDS: u32 = 1;
    pub const MAX_SOUND_SECONDS: u32 = 30;

    pub const MAX_PERCENT: u8 = 100;

    pub const MIN_GAIN: f32 = 0.0;
    pub const MAX_GAIN: f32 = 2.0;

    /// Variation indices are 0..=MAX_VARIATION
    pub const MAX_VARIATION: u8 = 9;
}
