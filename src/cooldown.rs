//! Attempt rationing.
//!
//! Attempts refill to [`MAX_ATTEMPTS`] once [`COOLDOWN_SECS`] have elapsed
//! since `last_reset_time`. The window is wall-clock and anchored to the
//! persisted reset time, so it carries over between runs of the program.
//! Every function here is pure: it reads a state and returns a new one.

use crate::state::{
    MAX_ATTEMPTS,
    PlayerState,
};
use chrono::{
    DateTime,
    TimeDelta,
    Utc,
};
use std::time::Duration;

pub const COOLDOWN_SECS: i64 = 15 * 60;

pub fn cooldown_window() -> TimeDelta {
    TimeDelta::seconds(COOLDOWN_SECS)
}

pub fn next_reset_at(state: &PlayerState) -> DateTime<Utc> {
    state.last_reset_time + cooldown_window()
}

/// Returns the refilled state if the window has elapsed at `now`, `None` if
/// nothing changes.
pub fn check_and_apply_reset(
    state: &PlayerState,
    now: DateTime<Utc>,
) -> Option<PlayerState> {
    if now < next_reset_at(state) {
        return None;
    }
    Some(PlayerState {
        attempts_left: MAX_ATTEMPTS,
        last_reset_time: now,
        ..state.clone()
    })
}

/// Zero once the window has elapsed; never negative.
pub fn time_until_reset(state: &PlayerState, now: DateTime<Utc>) -> Duration {
    (next_reset_at(state) - now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Returns the state with one attempt spent, or `None` when none are left.
pub fn consume_attempt(state: &PlayerState) -> Option<PlayerState> {
    let attempts_left = state.attempts_left.checked_sub(1)?;
    Some(PlayerState {
        attempts_left,
        ..state.clone()
    })
}
