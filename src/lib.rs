pub mod clock;
pub mod cooldown;
pub mod engine;
pub mod error;
pub mod format;
pub mod ledger;
pub mod session;
pub mod state;
pub mod store;

pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::engine::{RandomReels, Reels, ScriptedReels, SpinGrid, Symbol, WinLine};
pub use crate::error::{GachaError, Result};
pub use crate::ledger::{PackQuantity, TOKENS_PER_PACK, WIN_REWARD};
pub use crate::session::{
    PurchaseOutcome, ResetOutcome, Session, SpinOutcome, SpinReport, StatusOutcome,
};
pub use crate::state::{MAX_ATTEMPTS, PlayerState};
pub use crate::store::{JsonFileStore, MemoryStore, StateStore};
