//! Tier ladder, progression engine and the daily apply gate.

pub mod daily;
pub mod engine;
pub mod table;

pub use daily::{DailyRankUpdater, UserProgression};
pub use engine::{Advancement, TransitionKind};
pub use table::{TierDef, TierLadder, TOP_TIER_CEILING};
