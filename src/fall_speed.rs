/*!
A module that implements a minimalistic wrapper around `f64` for the game's
fall speed, asserting that it is in the playable range `0.5 ≤ v ≤ 10.0`.
*/

use std::time::Duration;

/// An [`f64`] fall speed known to lie in the playable range `0.5 ≤ v ≤ 10.0`,
/// measured in gravity ticks per second.
///
/// Unlike `f64`, `FallSpeed` does implement [`Eq`], [`Ord`], [`std::hash::Hash`].
#[derive(PartialEq, Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FallSpeed(f64);

impl Eq for FallSpeed {}

impl PartialOrd for FallSpeed {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FallSpeed {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::hash::Hash for FallSpeed {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.to_bits());
    }
}

impl FallSpeed {
    /// The slowest playable speed (0.5 ticks per second).
    pub const MIN: Self = Self(0.5);

    /// The fastest playable speed (10 ticks per second).
    pub const MAX: Self = Self(10.0);

    /// Creates a fall speed, clamping `value` into `0.5 ≤ v ≤ 10.0`.
    ///
    /// NaN collapses to the lower bound.
    pub fn new(value: f64) -> Self {
        if value >= Self::MAX.0 {
            Self::MAX
        } else if value >= Self::MIN.0 {
            Self(value)
        } else {
            Self::MIN
        }
    }

    /// Returns the contained value as `f64`.
    pub const fn get(&self) -> f64 {
        self.0
    }

    /// The gravity period this speed implies: a piece falls one row every
    /// `1/v` seconds.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.0)
    }
}

impl Default for FallSpeed {
    fn default() -> Self {
        Self(1.0)
    }
}
