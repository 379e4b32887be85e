//! The apply-once-daily gate around the progression engine.
//!
//! The engine itself is pure; this module owns the collaborator contract:
//! load the persisted progression trio, sum today's completed study minutes,
//! run one `advance`, and persist the result together with the apply date.
//! The persisted `last_applied` date replaces an in-memory "already applied
//! today" flag, so the gate survives process restarts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::Database;

use super::engine::Advancement;
use super::table::TierLadder;

/// The persisted per-user progression state: tier index, rank point, and the
/// date the daily update was last applied (None for fresh accounts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgression {
    pub tier: usize,
    pub rank_point: i64,
    pub last_applied: Option<NaiveDate>,
}

/// Runs the daily progression for a user, at most once per calendar day.
pub struct DailyRankUpdater<'a> {
    db: &'a Database,
    ladder: &'a TierLadder,
}

impl<'a> DailyRankUpdater<'a> {
    pub fn new(db: &'a Database, ladder: &'a TierLadder) -> Self {
        Self { db, ladder }
    }

    /// Apply today's study minutes to the user's rank.
    ///
    /// Returns `None` without touching anything if the update was already
    /// applied on `today`; calling twice on the same date is a no-op. On
    /// apply, the new tier, point and date are persisted in a single
    /// statement before the advancement is returned.
    ///
    /// # Errors
    /// Propagates storage errors and engine precondition violations (a
    /// persisted tier index outside the configured ladder).
    pub fn apply(&self, user_id: i64, today: NaiveDate) -> Result<Option<Advancement>> {
        let progression = self.db.user_progression(user_id)?;
        if progression.last_applied == Some(today) {
            return Ok(None);
        }

        let minutes = self.db.today_study_minutes(user_id, today)?;
        let advancement = self
            .ladder
            .advance(progression.tier, progression.rank_point, minutes)?;
        self.db
            .apply_progression(user_id, advancement.tier, advancement.rank_point, today)?;
        Ok(Some(advancement))
    }
}
