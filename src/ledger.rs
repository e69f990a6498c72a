use crate::{
    error::GachaError,
    state::PlayerState,
};
use chrono::{
    DateTime,
    Utc,
};
use std::{
    fmt,
    num::NonZeroU32,
    str::FromStr,
};

pub const WIN_REWARD: u64 = 10_000;
pub const TOKENS_PER_PACK: u64 = 5;

/// Number of packs in a purchase. Always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackQuantity(NonZeroU32);

impl PackQuantity {
    pub fn new(quantity: u32) -> Option<Self> {
        NonZeroU32::new(quantity).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub fn tokens(self) -> u64 {
        TOKENS_PER_PACK * u64::from(self.get())
    }
}

impl FromStr for PackQuantity {
    type Err = GachaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GachaError::InvalidPurchaseQuantity {
            input: s.to_string(),
        };
        let parsed = s.trim().parse::<i64>().map_err(|_| invalid())?;
        Self::try_from(parsed).map_err(|_| invalid())
    }
}

impl TryFrom<i64> for PackQuantity {
    type Error = GachaError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| GachaError::InvalidPurchaseQuantity {
                input: value.to_string(),
            })
    }
}

impl fmt::Display for PackQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Exactly one of the win or loss branches applies.
pub fn apply_spin_result(state: &PlayerState, is_win: bool) -> PlayerState {
    let mut next = state.clone();
    if is_win {
        next.balance = next.balance.saturating_add(WIN_REWARD);
        next.total_wins = next.total_wins.saturating_add(1);
    } else {
        next.total_losses = next.total_losses.saturating_add(1);
    }
    next
}

/// Grants tokens without charging the balance.
pub fn apply_purchase(state: &PlayerState, quantity: PackQuantity) -> PlayerState {
    PlayerState {
        tokens: state.tokens.saturating_add(quantity.tokens()),
        ..state.clone()
    }
}

pub fn reset_all(now: DateTime<Utc>) -> PlayerState {
    PlayerState::new(now)
}
