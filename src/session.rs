//! The player session: one load, compute, save cycle per action.

use crate::{
    clock::Clock,
    cooldown,
    engine::{
        Reels,
        SpinGrid,
        WinLine,
    },
    error::Result,
    format::format_timer,
    ledger::{
        self,
        PackQuantity,
        WIN_REWARD,
    },
    state::{
        MAX_ATTEMPTS,
        PlayerState,
    },
    store::StateStore,
};
use chrono::{
    DateTime,
    Utc,
};
use std::time::Duration;
use tracing::{
    debug,
    info,
};

#[derive(Clone, Debug, PartialEq)]
pub enum SpinOutcome {
    /// No attempts left; nothing was spun or saved.
    Exhausted { time_until_reset: Duration },
    Spun(SpinReport),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpinReport {
    pub grid: SpinGrid,
    pub winning_lines: Vec<WinLine>,
    pub reward: u64,
    pub balance: u64,
    pub attempts_left: u32,
    /// Present once the last attempt of the window was used.
    pub time_until_reset: Option<Duration>,
    pub reset_applied: bool,
}

impl SpinReport {
    pub fn is_win(&self) -> bool {
        !self.winning_lines.is_empty()
    }
}

impl SpinOutcome {
    pub fn success(&self) -> bool {
        matches!(self, SpinOutcome::Spun(report) if report.is_win())
    }

    pub fn message(&self) -> String {
        match self {
            SpinOutcome::Exhausted { time_until_reset } => format!(
                "Out of attempts! Wait {} more.",
                format_timer(*time_until_reset)
            ),
            SpinOutcome::Spun(report) if report.is_win() => {
                format!("WIN! +{} coins", report.reward)
            }
            SpinOutcome::Spun(_) => "No luck... try again later!".to_string(),
        }
    }

    pub fn attempts_left(&self) -> u32 {
        match self {
            SpinOutcome::Exhausted { .. } => 0,
            SpinOutcome::Spun(report) => report.attempts_left,
        }
    }

    /// Countdown shown after the spin that used the last attempt. An
    /// exhausted outcome already carries the wait in its message.
    pub fn timer_label(&self) -> Option<String> {
        match self {
            SpinOutcome::Exhausted { .. } => None,
            SpinOutcome::Spun(report) => report
                .time_until_reset
                .map(|left| format!("Reset in: {}", format_timer(left))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseOutcome {
    pub quantity: PackQuantity,
    pub tokens_gained: u64,
    pub tokens: u64,
    pub balance: u64,
}

impl PurchaseOutcome {
    pub fn message(&self) -> String {
        let plural = if self.quantity.get() == 1 { "" } else { "s" };
        format!(
            "Bought {} gacha pack{}! +{} tokens",
            self.quantity, plural, self.tokens_gained
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatusOutcome {
    pub balance: u64,
    pub tokens: u64,
    pub attempts_left: u32,
    pub total_wins: u64,
    pub total_losses: u64,
    pub time_until_reset: Duration,
    pub reset_applied: bool,
}

impl StatusOutcome {
    pub fn is_full(&self) -> bool {
        self.attempts_left >= MAX_ATTEMPTS
    }

    /// "Full" while attempts are topped up, otherwise the countdown.
    pub fn next_reset_label(&self) -> String {
        if self.is_full() {
            "Full".to_string()
        } else {
            format_timer(self.time_until_reset)
        }
    }

    pub fn win_rate(&self) -> Option<f64> {
        let total = self.total_wins.saturating_add(self.total_losses);
        (total > 0).then(|| self.total_wins as f64 / total as f64 * 100.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResetOutcome {
    pub state: PlayerState,
}

impl ResetOutcome {
    pub fn message(&self) -> String {
        "Game data reset".to_string()
    }
}

pub struct Session<S, C, R> {
    store: S,
    clock: C,
    reels: R,
}

impl<S: StateStore, C: Clock, R: Reels> Session<S, C, R> {
    pub fn new(store: S, clock: C, reels: R) -> Self {
        Self {
            store,
            clock,
            reels,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn load_or_new(&self, now: DateTime<Utc>) -> Result<PlayerState> {
        match self.store.load()? {
            Some(state) => Ok(state),
            None => {
                info!("no saved player found, starting a new one");
                Ok(PlayerState::new(now))
            }
        }
    }

    /// Loads the state and refills attempts if the cooldown elapsed.
    /// The flag reports whether a refill happened and still needs saving.
    fn load_current(&self, now: DateTime<Utc>) -> Result<(PlayerState, bool)> {
        let state = self.load_or_new(now)?;
        match cooldown::check_and_apply_reset(&state, now) {
            Some(refilled) => {
                info!(
                    previous_attempts = state.attempts_left,
                    "cooldown elapsed, attempts refilled"
                );
                Ok((refilled, true))
            }
            None => Ok((state, false)),
        }
    }

    pub fn spin(&mut self) -> Result<SpinOutcome> {
        let now = self.clock.now();
        let (state, reset_applied) = self.load_current(now)?;

        let Some(state) = cooldown::consume_attempt(&state) else {
            if reset_applied {
                self.store.save(&state)?;
            }
            let time_until_reset = cooldown::time_until_reset(&state, now);
            debug!(?time_until_reset, "spin refused, no attempts left");
            return Ok(SpinOutcome::Exhausted { time_until_reset });
        };

        let grid = self.reels.draw();
        let winning_lines = grid.winning_lines();
        let is_win = !winning_lines.is_empty();
        let state = ledger::apply_spin_result(&state, is_win);
        self.store.save(&state)?;

        if is_win {
            info!(balance = state.balance, lines = ?winning_lines, "spin won");
        } else {
            debug!(attempts_left = state.attempts_left, "spin lost");
        }

        let time_until_reset = (state.attempts_left == 0)
            .then(|| cooldown::time_until_reset(&state, now));
        Ok(SpinOutcome::Spun(SpinReport {
            grid,
            winning_lines,
            reward: if is_win { WIN_REWARD } else { 0 },
            balance: state.balance,
            attempts_left: state.attempts_left,
            time_until_reset,
            reset_applied,
        }))
    }

    pub fn purchase(&mut self, quantity: PackQuantity) -> Result<PurchaseOutcome> {
        let now = self.clock.now();
        let state = self.load_or_new(now)?;
        let state = ledger::apply_purchase(&state, quantity);
        self.store.save(&state)?;
        info!(packs = quantity.get(), tokens = state.tokens, "packs purchased");
        Ok(PurchaseOutcome {
            quantity,
            tokens_gained: quantity.tokens(),
            tokens: state.tokens,
            balance: state.balance,
        })
    }

    /// Validates raw user input before touching any state.
    pub fn purchase_input(&mut self, input: &str) -> Result<PurchaseOutcome> {
        let quantity = input.parse::<PackQuantity>().inspect_err(|e| {
            tracing::warn!(%e, "purchase rejected");
        })?;
        self.purchase(quantity)
    }

    pub fn status(&mut self) -> Result<StatusOutcome> {
        let now = self.clock.now();
        let (state, reset_applied) = self.load_current(now)?;
        if reset_applied {
            self.store.save(&state)?;
        }
        Ok(StatusOutcome {
            balance: state.balance,
            tokens: state.tokens,
            attempts_left: state.attempts_left,
            total_wins: state.total_wins,
            total_losses: state.total_losses,
            time_until_reset: cooldown::time_until_reset(&state, now),
            reset_applied,
        })
    }

    pub fn reset(&mut self) -> Result<ResetOutcome> {
        let state = ledger::reset_all(self.clock.now());
        self.store.save(&state)?;
        info!("player data reset");
        Ok(ResetOutcome { state })
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::{
        clock::FixedClock,
        engine::ScriptedReels,
        store::MemoryStore,
    };
    use chrono::{
        TimeDelta,
        TimeZone,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 2, 20, 0, 0).unwrap()
    }

    fn losing() -> SpinGrid {
        SpinGrid::from_indices([[0, 1, 2], [3, 4, 5], [1, 2, 3]])
    }

    #[test]
    fn spin__when_last_attempt_used_then_report_carries_timer() {
        // given
        let store = MemoryStore::with_state(PlayerState {
            attempts_left: 1,
            ..PlayerState::new(now() - TimeDelta::minutes(5))
        });
        let mut session =
            Session::new(store.clone(), FixedClock::new(now()), ScriptedReels::new([losing()]));

        // when
        let outcome = session.spin().unwrap();

        // then
        let SpinOutcome::Spun(report) = &outcome else {
            panic!("expected a spin, got {outcome:?}");
        };
        assert_eq!(report.attempts_left, 0);
        assert_eq!(report.time_until_reset, Some(Duration::from_secs(10 * 60)));
        assert_eq!(outcome.timer_label().as_deref(), Some("Reset in: 10m 0s"));
        assert_eq!(store.current().unwrap().total_losses, 1);
    }

    #[test]
    fn spin__when_attempts_remain_then_no_timer() {
        let mut session = Session::new(
            MemoryStore::new(),
            FixedClock::new(now()),
            ScriptedReels::new([losing()]),
        );

        let outcome = session.spin().unwrap();

        assert_eq!(outcome.timer_label(), None);
        assert!(!outcome.success());
        assert_eq!(outcome.message(), "No luck... try again later!");
    }

    #[test]
    fn spin__when_exhausted_then_wait_only_in_message() {
        let store = MemoryStore::with_state(PlayerState {
            attempts_left: 0,
            ..PlayerState::new(now() - TimeDelta::minutes(5))
        });
        let mut session =
            Session::new(store, FixedClock::new(now()), ScriptedReels::new([losing()]));

        let outcome = session.spin().unwrap();

        assert_eq!(outcome.message(), "Out of attempts! Wait 10m 0s more.");
        assert_eq!(outcome.timer_label(), None);
    }

    #[test]
    fn status__when_counters_near_limit_then_win_rate_does_not_overflow() {
        let status = StatusOutcome {
            balance: 0,
            tokens: 0,
            attempts_left: 0,
            total_wins: u64::MAX,
            total_losses: 1,
            time_until_reset: Duration::ZERO,
            reset_applied: false,
        };
        let quarter = StatusOutcome {
            total_wins: 1,
            total_losses: 3,
            ..status.clone()
        };

        assert_eq!(status.win_rate(), Some(100.0));
        assert_eq!(quarter.win_rate(), Some(25.0));
    }

    #[test]
    fn status__when_fresh_player_then_full_and_nothing_saved() {
        let store = MemoryStore::new();
        let mut session =
            Session::new(store.clone(), FixedClock::new(now()), ScriptedReels::new([]));

        let status = session.status().unwrap();

        assert!(status.is_full());
        assert_eq!(status.next_reset_label(), "Full");
        assert_eq!(status.win_rate(), None);
        assert_eq!(store.saves(), 0);
    }

    #[test]
    fn status__when_cooldown_elapsed_then_refill_is_saved() {
        let store = MemoryStore::with_state(PlayerState {
            attempts_left: 3,
            ..PlayerState::new(now() - TimeDelta::minutes(16))
        });
        let mut session =
            Session::new(store.clone(), FixedClock::new(now()), ScriptedReels::new([]));

        let status = session.status().unwrap();

        assert!(status.reset_applied);
        assert_eq!(status.attempts_left, MAX_ATTEMPTS);
        assert_eq!(store.saves(), 1);
        assert_eq!(store.current().unwrap().last_reset_time, now());
    }

    #[test]
    fn status__when_partially_spent_then_label_is_countdown() {
        let store = MemoryStore::with_state(PlayerState {
            attempts_left: 4,
            ..PlayerState::new(now() - TimeDelta::seconds(65))
        });
        let mut session = Session::new(store, FixedClock::new(now()), ScriptedReels::new([]));

        let status = session.status().unwrap();

        assert_eq!(status.next_reset_label(), "13m 55s");
    }

    #[test]
    fn purchase_input__when_not_a_number_then_rejected_without_save() {
        let store = MemoryStore::new();
        let mut session =
            Session::new(store.clone(), FixedClock::new(now()), ScriptedReels::new([]));

        let result = session.purchase_input("lots");

        assert!(result.is_err());
        assert_eq!(store.saves(), 0);
        assert_eq!(store.current(), None);
    }

    #[test]
    fn purchase__when_one_pack_then_singular_message() {
        let mut session = Session::new(
            MemoryStore::new(),
            FixedClock::new(now()),
            ScriptedReels::new([]),
        );

        let outcome = session.purchase(PackQuantity::new(1).unwrap()).unwrap();

        assert_eq!(outcome.message(), "Bought 1 gacha pack! +5 tokens");
    }

    #[test]
    fn reset__when_called_then_defaults_saved_with_current_anchor() {
        let mut dirty = PlayerState::new(now() - TimeDelta::hours(3));
        dirty.balance = 90_000;
        dirty.tokens = 25;
        dirty.attempts_left = 2;
        let store = MemoryStore::with_state(dirty);
        let mut session =
            Session::new(store.clone(), FixedClock::new(now()), ScriptedReels::new([]));

        let outcome = session.reset().unwrap();

        assert_eq!(outcome.state, PlayerState::new(now()));
        assert_eq!(store.current(), Some(PlayerState::new(now())));
        assert_eq!(store.saves(), 1);
    }
}
