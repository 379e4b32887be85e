//! # Studyrank Core Library
//!
//! Core business logic for Studyrank, a personal study tracker that turns
//! daily study minutes into a persistent competitive rank. All operations
//! are available through the standalone CLI binary, which is a thin layer
//! over this library.
//!
//! ## Architecture
//!
//! - **Tier engine**: a pure progression step — daily study minutes in,
//!   clamped rank-point delta and at most one tier step out
//! - **Daily gate**: persisted last-applied date ensuring the engine runs
//!   at most once per user per calendar day
//! - **Storage**: SQLite study log and user state, TOML configuration
//!
//! ## Key Components
//!
//! - [`TierLadder`]: validated static tier table with `advance`
//! - [`DailyRankUpdater`]: once-per-day apply over the database
//! - [`Database`]: session and progression persistence
//! - [`Config`]: application configuration management

pub mod error;
pub mod stats;
pub mod storage;
pub mod tier;

pub use error::{ConfigError, CoreError, DatabaseError, LadderError, ValidationError};
pub use stats::{StudyStats, SubjectStats};
pub use storage::{Config, Database, SessionLog, UserRecord};
pub use tier::{Advancement, DailyRankUpdater, TierDef, TierLadder, TransitionKind, UserProgression};
