//! Study statistics records.
//!
//! Aggregated by the database over completed sessions only; an open session
//! contributes nothing until it is finished.

use serde::{Deserialize, Serialize};

/// Daily and all-time study totals for one user.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StudyStats {
    pub total_sessions: u64,
    pub total_minutes: i64,
    pub total_felt_minutes: i64,
    pub today_sessions: u64,
    pub today_minutes: i64,
    /// Average focus rate (felt over actual, 0..100) across completed sessions.
    pub avg_focus_rate: f64,
}

/// Per-subject totals over completed sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectStats {
    pub subject: String,
    pub sessions: u64,
    pub total_minutes: i64,
    pub avg_focus_rate: f64,
}
