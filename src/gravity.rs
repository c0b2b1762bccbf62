/*!
This module schedules the automatic one-row descent on the game's internal
timeline.
*/

use crate::{FallSpeed, GameTime};

/// A repeating deadline on the in-game timeline.
///
/// The timer does not run on its own: the game compares the deadline against
/// the time handed to [`Game::update`](crate::Game::update) and fires one
/// downward move per elapsed period. Restarting replaces the cadence
/// wholesale; canceling makes the timer idle, so no late tick can fire after
/// a pause or a finished round.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GravityTimer {
    interval: GameTime,
    next_due: Option<GameTime>,
}

impl GravityTimer {
    /// A timer with no scheduled deadline.
    pub const fn idle() -> Self {
        Self {
            interval: GameTime::ZERO,
            next_due: None,
        }
    }

    /// Begins a fresh cadence: the next tick is due one interval after `now`,
    /// with the interval derived from `speed`.
    pub fn restart(&mut self, now: GameTime, speed: FallSpeed) {
        self.interval = speed.tick_interval();
        self.next_due = Some(now + self.interval);
    }

    /// Unschedules the deadline.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// When the next tick is due, if any.
    pub const fn next_due(&self) -> Option<GameTime> {
        self.next_due
    }

    /// Moves the deadline one interval further, keeping the cadence anchored
    /// to the tick that just fired.
    pub fn advance(&mut self) {
        if let Some(due) = self.next_due {
            self.next_due = Some(due + self.interval);
        }
    }
}

impl Default for GravityTimer {
    fn default() -> Self {
        Self::idle()
    }
}
