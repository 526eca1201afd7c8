//! Per-profile settings: enabled variations, interval and beep-count bounds

use serde::{Serialize, Serializer};
use std::collections::BTreeSet;

use crate::constants::validation::{
    MAX_BEEPS, MAX_INTERVAL_MINUTES, MAX_VARIATION, MIN_BEEPS, MIN_INTERVAL_MINUTES,
};
use crate::types::Profile;

use super::settings::{Bounds, Fields};

/// Non-empty subset of the variation indices 0..=9
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationSet(BTreeSet<u8>);

impl VariationSet {
    pub fn all() -> Self {
        Self((0..=MAX_VARIATION).collect())
    }

    /// Parse `all` or a comma-separated index list.
    /// Out-of-range entries are dropped; a parse failure or an empty result
    /// yields the full set.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            return Self::all();
        }

        let parsed: Result<Vec<i64>, _> = value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse::<i64>)
            .collect();

        match parsed {
            Ok(indices) => {
                let set: BTreeSet<u8> = indices
                    .into_iter()
                    .filter(|i| (0..=i64::from(MAX_VARIATION)).contains(i))
                    .map(|i| i as u8)
                    .collect();
                if set.is_empty() { Self::all() } else { Self(set) }
            }
            Err(_) => Self::all(),
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        u8::try_from(index).is_ok_and(|i| self.0.contains(&i))
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|&i| usize::from(i))
    }

    pub fn is_all(&self) -> bool {
        self.0.len() == usize::from(MAX_VARIATION) + 1
    }
}

impl Serialize for VariationSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

/// Settings that differ per profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSettings {
    pub variations: VariationSet,
    /// Pause after each pattern, in minutes
    pub interval_minutes: Bounds,
    /// Beeps per pattern (chatty profiles only)
    pub beeps: Bounds,
}

impl ProfileSettings {
    pub(super) fn from_fields(fields: &Fields<'_>, profile: Profile) -> Self {
        let prefix = profile.config_prefix();

        let variations = fields
            .raw(&format!("{prefix}_ENABLED_VARIATIONS"))
            .map(VariationSet::parse)
            .unwrap_or_else(VariationSet::all);

        let interval_minutes = fields.bounds(
            &format!("{prefix}_INTERVAL_MIN"),
            &format!("{prefix}_INTERVAL_MAX"),
            default_interval(profile),
            Bounds::new(MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES),
        );

        let beeps = fields.bounds(
            &format!("{prefix}_BEEPS_MIN"),
            &format!("{prefix}_BEEPS_MAX"),
            Bounds::new(1, 6),
            Bounds::new(MIN_BEEPS, MAX_BEEPS),
        );

        Self {
            variations,
            interval_minutes,
            beeps,
        }
    }
}

/// Built-in interval bounds (minutes)
fn default_interval(profile: Profile) -> Bounds {
    match profile {
        Profile::Mainframe => Bounds::new(1, 3),
        Profile::Wopr => Bounds::new(1, 2),
        Profile::Aliensterm => Bounds::new(1, 2),
        Profile::Modem => Bounds::new(3, 10),
    }
}
