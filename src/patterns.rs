//! Static pattern tables and the randomized shaping applied to them

use rand::seq::index;
use rand::Rng;
use std::time::Duration;

use crate::config::{Bounds, VariationSet};
use crate::constants::{timing, tone};
use crate::types::{BeepSpec, Profile};

/// One variation: an ordered tone sequence
pub type Pattern = &'static [BeepSpec];

/// Every profile has exactly this many variations, indexed 0..=9
pub const VARIATIONS: usize = 10;

const fn b(freq_hz: u32, duration_ms: u32) -> BeepSpec {
    BeepSpec::new(freq_hz, duration_ms)
}

const fn rest(duration_ms: u32) -> BeepSpec {
    BeepSpec::rest(duration_ms)
}

const WOPR: [Pattern; VARIATIONS] = [
    &[b(1200, 40), b(900, 35), b(1600, 50)],
    &[b(700, 70), b(1100, 40), b(700, 40)],
    &[b(300, 200)],
    &[b(1500, 30), b(1700, 30), b(1900, 40)],
    &[b(800, 60), b(600, 80)],
    &[b(1000, 35), b(1000, 35), b(600, 120)],
    &[b(400, 140), b(900, 50)],
    &[b(500, 25), b(1200, 45), b(800, 60)],
    &[b(600, 100)],
    &[b(1300, 20), b(900, 50), b(700, 80), b(1100, 40)],
];

const MAINFRAME: [Pattern; VARIATIONS] = [
    &[b(300, 80)],
    &[b(300, 80)],
    &[b(300, 80)],
    &[b(260, 120)],
    &[b(260, 120)],
    &[b(420, 60), b(320, 60)],
    &[b(220, 180)],
    &[b(500, 30), b(500, 30)],
    &[b(500, 30), b(500, 30)],
    &[b(180, 260)],
];

const ALIENSTERM: [Pattern; VARIATIONS] = [
    &[b(1400, 35), b(1200, 35), b(1000, 45)],
    &[b(1400, 35), b(1200, 35), b(1000, 45)],
    &[b(1800, 25), b(700, 90)],
    &[b(1600, 40), b(2000, 20), b(1600, 40)],
    &[b(1600, 40), b(2000, 20), b(1600, 40)],
    &[b(900, 60), b(1300, 60), b(900, 60)],
    &[b(2100, 18), b(1900, 18), b(1700, 18), b(1500, 18)],
    &[b(600, 160), b(1400, 40)],
    &[b(1000, 30), b(1500, 30), b(2000, 30), b(1200, 60)],
    &[b(2400, 15), b(800, 120)],
];

// Dial-up line noise: dial tone, DTMF, answer tone, handshake chirps
const MODEM: [Pattern; VARIATIONS] = [
    &[b(440, 600)],
    &[b(697, 90), rest(60), b(1209, 90), rest(60), b(852, 90), rest(60), b(1336, 90)],
    &[b(440, 400), rest(400), b(440, 400)],
    &[b(2100, 700)],
    &[b(1650, 60), b(1850, 60), b(1650, 60), b(1850, 60), b(980, 80), b(1180, 80)],
    &[b(1200, 120), b(2400, 120), b(1200, 120), rest(80), b(2250, 200)],
    &[b(2400, 40), b(1800, 40), b(2400, 40), b(1800, 40), b(2400, 40), b(1200, 150)],
    &[b(1800, 300), rest(100), b(1800, 150)],
    &[b(480, 250), rest(250), b(480, 250), rest(250), b(480, 250)],
    &[b(2100, 100), b(1200, 100), b(600, 200)],
];

pub fn table(profile: Profile) -> &'static [Pattern; VARIATIONS] {
    match profile {
        Profile::Wopr => &WOPR,
        Profile::Mainframe => &MAINFRAME,
        Profile::Aliensterm => &ALIENSTERM,
        Profile::Modem => &MODEM,
    }
}

/// Pick one variation uniformly from the enabled ones, or from the whole
/// table when none of the enabled indices exist. Returns (index, pattern).
pub fn select_pattern<R: Rng + ?Sized>(
    profile: Profile,
    enabled: &VariationSet,
    rng: &mut R,
) -> (usize, Pattern) {
    let table = table(profile);
    let mut candidates: Vec<usize> = (0..VARIATIONS).filter(|&i| enabled.contains(i)).collect();
    if candidates.is_empty() {
        candidates = (0..VARIATIONS).collect();
    }
    let index = candidates[rng.gen_range(0..candidates.len())];
    (index, table[index])
}

/// Beeps a chatty profile plays for one pattern, before jitter
pub fn beep_sequence<R: Rng + ?Sized>(pattern: Pattern, count: usize, rng: &mut R) -> Vec<BeepSpec> {
    match pattern {
        [] => Vec::new(),
        [single] => vec![*single; count],
        _ => {
            let extended: Vec<BeepSpec> = pattern
                .iter()
                .copied()
                .cycle()
                .take(pattern.len() * tone::REPLICATION)
                .collect();
            let amount = count.min(extended.len());
            index::sample(rng, extended.len(), amount)
                .into_iter()
                .map(|i| extended[i])
                .collect()
        }
    }
}

/// Randomize frequency and length of one beep within the audible limits
pub fn jitter<R: Rng + ?Sized>(beep: BeepSpec, rng: &mut R) -> BeepSpec {
    let offset = rng.gen_range(-tone::FREQ_JITTER_HZ..=tone::FREQ_JITTER_HZ);
    let freq = (beep.freq_hz as i32 + offset).clamp(tone::MIN_FREQ_HZ, tone::MAX_FREQ_HZ);

    let mult = rng.gen_range(tone::DUR_MULT_MIN..=tone::DUR_MULT_MAX);
    let duration = (f64::from(beep.duration_ms) * mult) as u32;
    let duration = duration.clamp(tone::MIN_DUR_MS, tone::MAX_DUR_MS);

    BeepSpec::new(freq as u32, duration)
}

pub fn beep_count<R: Rng + ?Sized>(bounds: Bounds, rng: &mut R) -> usize {
    rng.gen_range(bounds.min..=bounds.max) as usize
}

/// Pause after each chatty beep
pub fn beep_pause<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    Duration::from_secs_f64(rng.gen_range(timing::BEEP_PAUSE_MIN_SECS..=timing::BEEP_PAUSE_MAX_SECS))
}

/// Uniform sleep between `bounds` minutes, at second resolution or finer
pub fn interval<R: Rng + ?Sized>(minutes: Bounds, rng: &mut R) -> Duration {
    let min = f64::from(minutes.min) * 60.0;
    let max = f64::from(minutes.max) * 60.0;
    Duration::from_secs_f64(rng.gen_range(min..=max))
}
