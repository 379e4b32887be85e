//! SQLite-based study log and user storage.
//!
//! Provides persistent storage for:
//! - User accounts with their tier progression trio
//!   (tier index, rank point, last-applied date)
//! - Study sessions (open sessions have a NULL end time)
//! - Study statistics (daily, all-time and per-subject)

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, DatabaseError, Result, ValidationError};
use crate::stats::{StudyStats, SubjectStats};
use crate::tier::UserProgression;

use super::data_dir;

/// A user row. Progression starts at the bottom of the ladder and is only
/// ever mutated through [`Database::apply_progression`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub tier_index: usize,
    pub rank_point: i64,
    pub last_applied: Option<NaiveDate>,
}

/// One study log entry. `ended_at` is NULL while the session is running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub subject: String,
    pub felt_minutes: Option<i64>,
    /// Felt minutes over actual minutes, 0..100, two decimals.
    pub focus_rate: Option<f64>,
}

/// SQLite database for users and study sessions.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/studyrank/studyrank.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("studyrank.db"))
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &std::path::Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id           INTEGER PRIMARY KEY AUTOINCREMENT,
                    username     TEXT UNIQUE NOT NULL,
                    tier_index   INTEGER NOT NULL DEFAULT 0,
                    rank_point   INTEGER NOT NULL DEFAULT 0,
                    last_applied TEXT
                );

                CREATE TABLE IF NOT EXISTS sessions (
                    id           INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id      INTEGER NOT NULL REFERENCES users(id),
                    started_at   TEXT NOT NULL,
                    ended_at     TEXT,
                    subject      TEXT NOT NULL DEFAULT '',
                    felt_minutes INTEGER,
                    focus_rate   REAL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_user_started
                    ON sessions(user_id, started_at);
                CREATE INDEX IF NOT EXISTS idx_sessions_user_subject
                    ON sessions(user_id, subject);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // ── Users ────────────────────────────────────────────────────────

    /// Create a user at the bottom of the ladder.
    ///
    /// # Errors
    /// Fails if the username is already taken.
    pub fn create_user(&self, username: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO users (username) VALUES (?1)",
            params![username],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, username, tier_index, rank_point, last_applied
                 FROM users WHERE username = ?1",
                params![username],
                Self::read_user,
            )
            .optional()
            .map_err(DatabaseError::from)?;
        row.transpose()
    }

    /// Look up a user by name, creating them on first use.
    pub fn find_or_create_user(&self, username: &str) -> Result<UserRecord> {
        if let Some(user) = self.find_user(username)? {
            return Ok(user);
        }
        let id = self.create_user(username)?;
        Ok(UserRecord {
            id,
            username: username.to_string(),
            tier_index: 0,
            rank_point: 0,
            last_applied: None,
        })
    }

    /// Remove a user and their entire study log.
    pub fn delete_user(&self, user_id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])?;
        self.conn
            .execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        Ok(())
    }

    /// Load the persisted progression trio for a user.
    pub fn user_progression(&self, user_id: i64) -> Result<UserProgression> {
        let row = self
            .conn
            .query_row(
                "SELECT tier_index, rank_point, last_applied FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(DatabaseError::from)?
            .ok_or(DatabaseError::NotFound {
                entity: "user",
                id: user_id,
            })?;
        Ok(UserProgression {
            tier: row.0 as usize,
            rank_point: row.1,
            last_applied: parse_date(row.2)?,
        })
    }

    /// Persist a progression result together with its apply date.
    ///
    /// Single UPDATE statement, so tier, point and date can never be
    /// persisted separately.
    pub fn apply_progression(
        &self,
        user_id: i64,
        tier: usize,
        rank_point: i64,
        applied_on: NaiveDate,
    ) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE users SET tier_index = ?1, rank_point = ?2, last_applied = ?3
             WHERE id = ?4",
            params![tier as i64, rank_point, applied_on.to_string(), user_id],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound {
                entity: "user",
                id: user_id,
            }
            .into());
        }
        Ok(())
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Open a new study session. The session stays open (`ended_at` NULL)
    /// until finished or cancelled.
    pub fn start_session(
        &self,
        user_id: i64,
        started_at: DateTime<Utc>,
        subject: &str,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (user_id, started_at, subject) VALUES (?1, ?2, ?3)",
            params![user_id, started_at.to_rfc3339(), subject],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The most recent open session for a user, if any.
    pub fn active_session(&self, user_id: i64) -> Result<Option<SessionLog>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, started_at, ended_at, subject, felt_minutes, focus_rate
                 FROM sessions
                 WHERE user_id = ?1 AND ended_at IS NULL
                 ORDER BY started_at DESC LIMIT 1",
                params![user_id],
                Self::read_session,
            )
            .optional()
            .map_err(DatabaseError::from)?;
        row.transpose()
    }

    /// Close an open session, recording subject, felt minutes and the focus
    /// rate (felt over actual, clamped to 0..100, two decimals).
    ///
    /// Returns the actual duration in minutes.
    ///
    /// # Errors
    /// Fails if the session does not exist, is already closed, or
    /// `felt_minutes` is negative.
    pub fn finish_session(
        &self,
        session_id: i64,
        user_id: i64,
        ended_at: DateTime<Utc>,
        subject: &str,
        felt_minutes: i64,
    ) -> Result<i64> {
        if felt_minutes < 0 {
            return Err(ValidationError::NegativeFeltMinutes {
                minutes: felt_minutes,
            }
            .into());
        }
        let started_at: String = self
            .conn
            .query_row(
                "SELECT started_at FROM sessions
                 WHERE id = ?1 AND user_id = ?2 AND ended_at IS NULL",
                params![session_id, user_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(DatabaseError::from)?
            .ok_or(DatabaseError::NotFound {
                entity: "open session",
                id: session_id,
            })?;
        let started_at = parse_timestamp(&started_at)?;

        let duration_minutes = (ended_at - started_at).num_minutes().max(0);
        let focus_rate = if duration_minutes > 0 {
            let rate = (felt_minutes as f64 / duration_minutes as f64) * 100.0;
            (rate.clamp(0.0, 100.0) * 100.0).round() / 100.0
        } else {
            0.0
        };

        self.conn.execute(
            "UPDATE sessions
             SET ended_at = ?1, subject = ?2, felt_minutes = ?3, focus_rate = ?4
             WHERE id = ?5",
            params![
                ended_at.to_rfc3339(),
                subject,
                felt_minutes,
                focus_rate,
                session_id
            ],
        )?;
        Ok(duration_minutes)
    }

    /// Delete an open session. Returns false if there was nothing to cancel.
    pub fn cancel_session(&self, session_id: i64, user_id: i64) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM sessions WHERE id = ?1 AND user_id = ?2 AND ended_at IS NULL",
            params![session_id, user_id],
        )?;
        Ok(deleted > 0)
    }

    /// Delete a log entry, open or closed. Returns false if it didn't exist.
    pub fn delete_log(&self, user_id: i64, log_id: i64) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM sessions WHERE id = ?1 AND user_id = ?2",
            params![log_id, user_id],
        )?;
        Ok(deleted > 0)
    }

    /// Total completed-session minutes for one calendar date.
    ///
    /// Open sessions are excluded; only sessions with an end time count
    /// toward the daily progression.
    pub fn today_study_minutes(&self, user_id: i64, date: NaiveDate) -> Result<i64> {
        let minutes: f64 = self.conn.query_row(
            "SELECT COALESCE(SUM((julianday(ended_at) - julianday(started_at)) * 24 * 60), 0)
             FROM sessions
             WHERE user_id = ?1 AND ended_at IS NOT NULL AND DATE(started_at) = ?2",
            params![user_id, date.to_string()],
            |row| row.get(0),
        )?;
        Ok(minutes.round() as i64)
    }

    /// Newest-first study log entries.
    pub fn recent_logs(&self, user_id: i64, limit: u32) -> Result<Vec<SessionLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, ended_at, subject, felt_minutes, focus_rate
             FROM sessions
             WHERE user_id = ?1
             ORDER BY started_at DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit], Self::read_session)?;
        let mut logs = Vec::new();
        for row in rows {
            logs.push(row.map_err(DatabaseError::from)??);
        }
        Ok(logs)
    }

    // ── Stats ────────────────────────────────────────────────────────

    /// All-time and same-day study statistics.
    pub fn stats(&self, user_id: i64, today: NaiveDate) -> Result<StudyStats> {
        let mut stats = StudyStats::default();

        let row = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM((julianday(ended_at) - julianday(started_at)) * 24 * 60), 0),
                    COALESCE(SUM(felt_minutes), 0),
                    COALESCE(AVG(focus_rate), 0)
             FROM sessions
             WHERE user_id = ?1 AND ended_at IS NOT NULL",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            },
        )?;
        stats.total_sessions = row.0;
        stats.total_minutes = row.1.round() as i64;
        stats.total_felt_minutes = row.2;
        stats.avg_focus_rate = (row.3 * 100.0).round() / 100.0;

        let row = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM((julianday(ended_at) - julianday(started_at)) * 24 * 60), 0)
             FROM sessions
             WHERE user_id = ?1 AND ended_at IS NOT NULL AND DATE(started_at) = ?2",
            params![user_id, today.to_string()],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, f64>(1)?)),
        )?;
        stats.today_sessions = row.0;
        stats.today_minutes = row.1.round() as i64;

        Ok(stats)
    }

    /// Per-subject totals over completed sessions, largest first.
    pub fn stats_by_subject(&self, user_id: i64) -> Result<Vec<SubjectStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT subject, COUNT(*),
                    COALESCE(SUM((julianday(ended_at) - julianday(started_at)) * 24 * 60), 0),
                    COALESCE(AVG(focus_rate), 0)
             FROM sessions
             WHERE user_id = ?1 AND ended_at IS NOT NULL
             GROUP BY subject
             ORDER BY 3 DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(SubjectStats {
                subject: row.get(0)?,
                sessions: row.get(1)?,
                total_minutes: row.get::<_, f64>(2)?.round() as i64,
                avg_focus_rate: (row.get::<_, f64>(3)? * 100.0).round() / 100.0,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(DatabaseError::from)?);
        }
        Ok(out)
    }

    // ── Row mapping ──────────────────────────────────────────────────

    fn read_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<UserRecord>> {
        let id: i64 = row.get(0)?;
        let username: String = row.get(1)?;
        let tier_index: i64 = row.get(2)?;
        let rank_point: i64 = row.get(3)?;
        let last_applied: Option<String> = row.get(4)?;
        Ok(parse_date(last_applied).map(|last_applied| UserRecord {
            id,
            username,
            tier_index: tier_index as usize,
            rank_point,
            last_applied,
        }))
    }

    fn read_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<SessionLog>> {
        let id: i64 = row.get(0)?;
        let started_at: String = row.get(1)?;
        let ended_at: Option<String> = row.get(2)?;
        let subject: String = row.get(3)?;
        let felt_minutes: Option<i64> = row.get(4)?;
        let focus_rate: Option<f64> = row.get(5)?;
        Ok(build_session_log(
            id,
            &started_at,
            ended_at.as_deref(),
            subject,
            felt_minutes,
            focus_rate,
        ))
    }
}

fn build_session_log(
    id: i64,
    started_at: &str,
    ended_at: Option<&str>,
    subject: String,
    felt_minutes: Option<i64>,
    focus_rate: Option<f64>,
) -> Result<SessionLog> {
    Ok(SessionLog {
        id,
        started_at: parse_timestamp(started_at)?,
        ended_at: ended_at.map(parse_timestamp).transpose()?,
        subject,
        felt_minutes,
        focus_rate,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{raw}': {e}")).into())
}

fn parse_date(raw: Option<String>) -> Result<Option<NaiveDate>> {
    raw.map(|s| {
        s.parse::<NaiveDate>()
            .map_err(|e| CoreError::from(DatabaseError::QueryFailed(format!("bad date '{s}': {e}"))))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn new_user_starts_at_ladder_bottom() {
        let db = Database::open_memory().unwrap();
        let user = db.find_or_create_user("mina").unwrap();
        assert_eq!(user.tier_index, 0);
        assert_eq!(user.rank_point, 0);
        assert!(user.last_applied.is_none());

        // Looking up again returns the same row.
        let again = db.find_or_create_user("mina").unwrap();
        assert_eq!(again.id, user.id);
    }

    #[test]
    fn duplicate_username_rejected() {
        let db = Database::open_memory().unwrap();
        db.create_user("mina").unwrap();
        assert!(db.create_user("mina").is_err());
    }

    #[test]
    fn session_lifecycle() {
        let db = Database::open_memory().unwrap();
        let user = db.find_or_create_user("mina").unwrap();
        let start = sample_time();

        let sid = db.start_session(user.id, start, "math").unwrap();
        let active = db.active_session(user.id).unwrap().unwrap();
        assert_eq!(active.id, sid);
        assert_eq!(active.subject, "math");
        assert!(active.ended_at.is_none());

        let duration = db
            .finish_session(sid, user.id, start + Duration::minutes(50), "math", 40)
            .unwrap();
        assert_eq!(duration, 50);
        assert!(db.active_session(user.id).unwrap().is_none());

        let logs = db.recent_logs(user.id, 10).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].felt_minutes, Some(40));
        assert_eq!(logs[0].focus_rate, Some(80.0));
    }

    #[test]
    fn focus_rate_clamped_to_hundred() {
        let db = Database::open_memory().unwrap();
        let user = db.find_or_create_user("mina").unwrap();
        let start = sample_time();
        let sid = db.start_session(user.id, start, "math").unwrap();
        // Felt longer than the wall clock: rate caps at 100.
        db.finish_session(sid, user.id, start + Duration::minutes(10), "math", 90)
            .unwrap();
        let logs = db.recent_logs(user.id, 1).unwrap();
        assert_eq!(logs[0].focus_rate, Some(100.0));
    }

    #[test]
    fn finish_rejects_negative_felt_minutes() {
        let db = Database::open_memory().unwrap();
        let user = db.find_or_create_user("mina").unwrap();
        let sid = db.start_session(user.id, sample_time(), "math").unwrap();
        let err = db
            .finish_session(sid, user.id, sample_time(), "math", -5)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::NegativeFeltMinutes { minutes: -5 })
        ));
    }

    #[test]
    fn cancel_only_removes_open_sessions() {
        let db = Database::open_memory().unwrap();
        let user = db.find_or_create_user("mina").unwrap();
        let start = sample_time();
        let sid = db.start_session(user.id, start, "math").unwrap();
        db.finish_session(sid, user.id, start + Duration::minutes(5), "math", 5)
            .unwrap();
        assert!(!db.cancel_session(sid, user.id).unwrap());

        let open = db.start_session(user.id, start, "math").unwrap();
        assert!(db.cancel_session(open, user.id).unwrap());
    }

    #[test]
    fn today_minutes_exclude_open_sessions() {
        let db = Database::open_memory().unwrap();
        let user = db.find_or_create_user("mina").unwrap();
        let start = sample_time();

        let done = db.start_session(user.id, start, "math").unwrap();
        db.finish_session(done, user.id, start + Duration::minutes(45), "math", 45)
            .unwrap();
        // Still running, must not count.
        db.start_session(user.id, start + Duration::hours(2), "english")
            .unwrap();
        // Different day, must not count.
        let other = db
            .start_session(user.id, start - Duration::days(1), "math")
            .unwrap();
        db.finish_session(
            other,
            user.id,
            start - Duration::days(1) + Duration::minutes(30),
            "math",
            30,
        )
        .unwrap();

        let minutes = db.today_study_minutes(user.id, start.date_naive()).unwrap();
        assert_eq!(minutes, 45);
    }

    #[test]
    fn apply_progression_persists_trio() {
        let db = Database::open_memory().unwrap();
        let user = db.find_or_create_user("mina").unwrap();
        let date = sample_time().date_naive();
        db.apply_progression(user.id, 1, 110, date).unwrap();

        let prog = db.user_progression(user.id).unwrap();
        assert_eq!(prog.tier, 1);
        assert_eq!(prog.rank_point, 110);
        assert_eq!(prog.last_applied, Some(date));
    }

    #[test]
    fn apply_progression_unknown_user_fails() {
        let db = Database::open_memory().unwrap();
        let err = db
            .apply_progression(42, 0, 0, sample_time().date_naive())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Database(DatabaseError::NotFound { entity: "user", id: 42 })
        ));
    }

    #[test]
    fn stats_aggregate_sessions() {
        let db = Database::open_memory().unwrap();
        let user = db.find_or_create_user("mina").unwrap();
        let start = sample_time();

        for (offset, subject, minutes, felt) in
            [(0, "math", 60, 30), (90, "math", 30, 30), (180, "english", 10, 5)]
        {
            let sid = db
                .start_session(user.id, start + Duration::minutes(offset), subject)
                .unwrap();
            db.finish_session(
                sid,
                user.id,
                start + Duration::minutes(offset + minutes),
                subject,
                felt,
            )
            .unwrap();
        }

        let stats = db.stats(user.id, start.date_naive()).unwrap();
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.total_minutes, 100);
        assert_eq!(stats.total_felt_minutes, 65);
        assert_eq!(stats.today_sessions, 3);
        assert_eq!(stats.today_minutes, 100);

        let subjects = db.stats_by_subject(user.id).unwrap();
        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0].subject, "math");
        assert_eq!(subjects[0].sessions, 2);
        assert_eq!(subjects[0].total_minutes, 90);
        assert_eq!(subjects[1].subject, "english");
    }

    #[test]
    fn open_at_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("studyrank.db");

        {
            let db = Database::open_at(&path).unwrap();
            let user = db.find_or_create_user("mina").unwrap();
            db.apply_progression(user.id, 2, 310, sample_time().date_naive())
                .unwrap();
        }

        let db = Database::open_at(&path).unwrap();
        let user = db.find_user("mina").unwrap().unwrap();
        assert_eq!(user.tier_index, 2);
        assert_eq!(user.rank_point, 310);
    }

    #[test]
    fn delete_user_removes_log() {
        let db = Database::open_memory().unwrap();
        let user = db.find_or_create_user("mina").unwrap();
        db.start_session(user.id, sample_time(), "math").unwrap();
        db.delete_user(user.id).unwrap();
        assert!(db.find_user("mina").unwrap().is_none());
        assert!(db.recent_logs(user.id, 10).unwrap().is_empty());
    }
}
