//! The daily tier progression step.
//!
//! `TierLadder::advance` converts one day of study minutes into a rank point
//! delta and restores the band invariant by stepping the tier at most once.
//! The computation is pure: no I/O, no clock, no hidden state. Persisting
//! the result and enforcing the once-per-day gate are the caller's job
//! (see [`crate::tier::daily`]).

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::table::TierLadder;

/// How a day's delta moved the user relative to the tier cutlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Crossed the tier's ceiling; moved up one tier.
    Promoted,
    /// Fell below the tier's floor; moved down one tier.
    Demoted,
    /// Would have fallen below the floor, but the tier's avoid-fall flag
    /// capped the loss at the floor instead.
    DemotionBlocked,
    /// Point moved (or held) within the tier's band.
    Unchanged,
}

/// Result of one progression step.
///
/// `point_before + change == rank_point` always holds, so the old point, the
/// new point and the applied delta are all recoverable from the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advancement {
    /// Tier index after the step.
    pub tier: usize,
    /// Rank point after the step.
    pub rank_point: i64,
    /// The delta actually applied. In the `DemotionBlocked` case this is the
    /// floored loss, which is less negative than the clamped raw delta.
    pub change: i64,
    /// Rank point before the step.
    pub point_before: i64,
    pub kind: TransitionKind,
    /// Human-readable transition report.
    pub message: String,
}

impl TierLadder {
    /// Apply one day of study to `(tier, rank_point)`.
    ///
    /// The raw delta is `study_minutes - daily_required`, clamped to the
    /// tier's `[min_loss, max_gain]`. Crossing the ceiling promotes one
    /// tier; dropping below the floor demotes one tier unless the tier's
    /// `avoid_fall` flag floors the loss at the cutline.
    ///
    /// Promotion and demotion step exactly one tier per call. With the
    /// built-in clamps a daily delta cannot span two cutlines; exotic custom
    /// ladders where it could keep the single-step behavior.
    ///
    /// # Errors
    /// `ValidationError` if `tier` is out of range or `study_minutes` is
    /// negative. The function is total otherwise.
    pub fn advance(
        &self,
        tier: usize,
        rank_point: i64,
        study_minutes: i64,
    ) -> Result<Advancement, ValidationError> {
        let def = self.get(tier).ok_or(ValidationError::TierOutOfRange {
            index: tier,
            len: self.len(),
        })?;
        if study_minutes < 0 {
            return Err(ValidationError::NegativeMinutes {
                minutes: study_minutes,
            });
        }

        let delta = study_minutes - def.daily_required;
        let change = delta.clamp(def.min_loss, def.max_gain);

        // The top tier's sentinel ceiling keeps this branch unreachable on
        // the built-in ladder; the index check covers custom ladders with a
        // finite top ceiling.
        if tier + 1 < self.len() && rank_point + change >= def.ceiling {
            let new_point = rank_point + change;
            let new_tier = tier + 1;
            return Ok(Advancement {
                tier: new_tier,
                rank_point: new_point,
                change,
                point_before: rank_point,
                kind: TransitionKind::Promoted,
                message: format!(
                    "Tier up: {} -> {} | points {} -> {} ({:+})",
                    def.name,
                    self.name(new_tier),
                    rank_point,
                    new_point,
                    change
                ),
            });
        }

        if rank_point + change < def.floor {
            if def.avoid_fall {
                // Loss is capped at the cutline; the applied change may be
                // less negative than the clamped delta.
                let floored_change = def.floor - rank_point;
                return Ok(Advancement {
                    tier,
                    rank_point: def.floor,
                    change: floored_change,
                    point_before: rank_point,
                    kind: TransitionKind::DemotionBlocked,
                    message: format!(
                        "Demotion avoided: holding {} | points {} -> {} ({:+})",
                        def.name, rank_point, def.floor, floored_change
                    ),
                });
            }
            // Ladder validation guarantees avoid_fall on tier 0, so this
            // subtraction cannot underflow.
            let new_point = rank_point + change;
            let new_tier = tier - 1;
            return Ok(Advancement {
                tier: new_tier,
                rank_point: new_point,
                change,
                point_before: rank_point,
                kind: TransitionKind::Demoted,
                message: format!(
                    "Tier down: {} -> {} | points {} -> {} ({:+})",
                    def.name,
                    self.name(new_tier),
                    rank_point,
                    new_point,
                    change
                ),
            });
        }

        let new_point = rank_point + change;
        Ok(Advancement {
            tier,
            rank_point: new_point,
            change,
            point_before: rank_point,
            kind: TransitionKind::Unchanged,
            message: format!(
                "Points changed: {} -> {} ({:+})",
                rank_point, new_point, change
            ),
        })
    }
}
