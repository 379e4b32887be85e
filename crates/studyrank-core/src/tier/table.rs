//! The static tier ladder.
//!
//! A ladder is an ordered sequence of per-tier records. Each record carries
//! both cutlines of its point band plus the daily study requirement and the
//! clamps on the daily point delta, so a single record is enough to run one
//! progression step without consulting its neighbours.
//!
//! Ladders are validated at construction and immutable afterwards. The
//! built-in ladder reproduces the original 20-tier ranked ladder, Rookie
//! through Ultimate.

use serde::{Deserialize, Serialize};

use crate::error::LadderError;

/// Sentinel ceiling on the top tier. No daily delta can reach it, so the
/// promotion branch never fires at the top of the ladder.
pub const TOP_TIER_CEILING: i64 = 1_000_000_000;

/// One tier of the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDef {
    /// Display name, e.g. "Bronze II".
    pub name: String,
    /// Minimum rank point to sit in this tier (inclusive).
    pub floor: i64,
    /// Rank point at which the next tier starts (exclusive upper bound).
    pub ceiling: i64,
    /// Study minutes per day required to hold the tier with zero point change.
    pub daily_required: i64,
    /// Upper clamp on the daily point delta.
    pub max_gain: i64,
    /// Lower clamp on the daily point delta (zero or negative).
    pub min_loss: i64,
    /// If set, losses are floored at `floor` instead of demoting.
    pub avoid_fall: bool,
}

/// Validated, immutable tier ladder.
///
/// Guarantees after construction:
/// - at least one tier
/// - `floor == 0` on the first tier
/// - `floor < ceiling` on every tier and `floor == previous ceiling`,
///   i.e. cutlines are strictly increasing with no gaps
/// - `min_loss <= 0` and `max_gain >= 0` on every tier
/// - `avoid_fall` set on the first tier, so demotion can never underflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TierDef>", into = "Vec<TierDef>")]
pub struct TierLadder {
    tiers: Vec<TierDef>,
}

impl TierLadder {
    /// Build a ladder from tier records, checking the static invariants.
    ///
    /// # Errors
    /// Returns the first violated invariant. A ladder that fails here must
    /// reject startup; `advance` assumes a valid ladder.
    pub fn new(tiers: Vec<TierDef>) -> Result<Self, LadderError> {
        let first = tiers.first().ok_or(LadderError::Empty)?;
        if first.floor != 0 {
            return Err(LadderError::NonZeroBase {
                name: first.name.clone(),
                floor: first.floor,
            });
        }
        if !first.avoid_fall {
            return Err(LadderError::FallibleBase {
                name: first.name.clone(),
            });
        }

        let mut previous_ceiling = 0i64;
        for tier in &tiers {
            if tier.floor >= tier.ceiling {
                return Err(LadderError::EmptyBand {
                    name: tier.name.clone(),
                    floor: tier.floor,
                    ceiling: tier.ceiling,
                });
            }
            if tier.floor != previous_ceiling {
                return Err(LadderError::CutlineGap {
                    name: tier.name.clone(),
                    floor: tier.floor,
                    previous_ceiling,
                });
            }
            if tier.min_loss > 0 {
                return Err(LadderError::PositiveMinLoss {
                    name: tier.name.clone(),
                    min_loss: tier.min_loss,
                });
            }
            if tier.max_gain < 0 {
                return Err(LadderError::NegativeMaxGain {
                    name: tier.name.clone(),
                    max_gain: tier.max_gain,
                });
            }
            previous_ceiling = tier.ceiling;
        }

        Ok(Self { tiers })
    }

    /// The built-in 20-tier ladder with the original constants.
    pub fn builtin() -> Self {
        Self {
            tiers: builtin_tiers(),
        }
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TierDef> {
        self.tiers.get(index)
    }

    pub fn tiers(&self) -> &[TierDef] {
        &self.tiers
    }

    /// Display name of a tier, or "?" for an out-of-range index.
    pub fn name(&self, index: usize) -> &str {
        self.tiers.get(index).map(|t| t.name.as_str()).unwrap_or("?")
    }

    /// The tier whose band contains `rank_point`, if any.
    pub fn tier_for_point(&self, rank_point: i64) -> Option<usize> {
        self.tiers
            .iter()
            .position(|t| t.floor <= rank_point && rank_point < t.ceiling)
    }
}

impl TryFrom<Vec<TierDef>> for TierLadder {
    type Error = LadderError;

    fn try_from(tiers: Vec<TierDef>) -> Result<Self, LadderError> {
        Self::new(tiers)
    }
}

impl From<TierLadder> for Vec<TierDef> {
    fn from(ladder: TierLadder) -> Self {
        ladder.tiers
    }
}

/// (name, ceiling, daily_required, max_gain, min_loss, avoid_fall) rows of
/// the built-in ladder. Floors are derived from the previous ceiling.
const BUILTIN_ROWS: [(&str, i64, i64, i64, i64, bool); 20] = [
    ("Rookie", 100, 0, 80, 0, true),
    ("Bronze I", 300, 0, 100, -25, true),
    ("Bronze II", 500, 10, 100, -25, true),
    ("Bronze III", 700, 20, 100, -25, true),
    ("Silver I", 1000, 30, 100, -50, true),
    ("Silver II", 1300, 40, 100, -50, true),
    ("Silver III", 1600, 50, 100, -50, true),
    ("Gold I", 2000, 60, 100, -75, true),
    ("Gold II", 2400, 80, 100, -75, true),
    ("Gold III", 2800, 100, 100, -75, true),
    ("Diamond I", 3400, 120, 120, -100, true),
    ("Diamond II", 4000, 140, 120, -100, false),
    ("Diamond III", 4600, 160, 120, -100, false),
    ("Crystal I", 5400, 180, 120, -150, true),
    ("Crystal II", 6200, 210, 120, -150, false),
    ("Crystal III", 7000, 240, 120, -150, false),
    ("Legend I", 8000, 270, 150, -200, false),
    ("Legend II", 9000, 300, 150, -200, false),
    ("Legend III", 10000, 330, 150, -200, false),
    ("Ultimate", TOP_TIER_CEILING, 360, 150, -300, false),
];

fn builtin_tiers() -> Vec<TierDef> {
    let mut floor = 0i64;
    BUILTIN_ROWS
        .iter()
        .map(|&(name, ceiling, daily_required, max_gain, min_loss, avoid_fall)| {
            let def = TierDef {
                name: name.to_string(),
                floor,
                ceiling,
                daily_required,
                max_gain,
                min_loss,
                avoid_fall,
            };
            floor = ceiling;
            def
        })
        .collect()
}
