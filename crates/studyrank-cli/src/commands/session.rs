use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use studyrank_core::tier::{Advancement, DailyRankUpdater};

use super::context;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a study session
    Start {
        /// Subject to study (defaults to the configured subject)
        #[arg(long)]
        subject: Option<String>,
    },
    /// Finish the running session and apply the daily rank update
    Finish {
        /// Self-reported focused minutes
        #[arg(long)]
        felt: i64,
        /// Override the subject recorded at start
        #[arg(long)]
        subject: Option<String>,
    },
    /// Cancel the running session without recording it
    Cancel,
    /// Show the running session, if any
    Status,
}

#[derive(Serialize)]
struct FinishReport {
    session_id: i64,
    duration_minutes: i64,
    subject: String,
    /// None when the daily update already ran today.
    rank_update: Option<Advancement>,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = context()?;
    let now = Utc::now();

    match action {
        SessionAction::Start { subject } => {
            if let Some(active) = ctx.db.active_session(ctx.user.id)? {
                return Err(format!(
                    "a session is already running (id {}, started {})",
                    active.id,
                    active.started_at.to_rfc3339()
                )
                .into());
            }
            let subject = subject.unwrap_or_else(|| ctx.config.timer.default_subject.clone());
            let id = ctx.db.start_session(ctx.user.id, now, &subject)?;
            println!(
                "{}",
                serde_json::json!({
                    "session_id": id,
                    "started_at": now.to_rfc3339(),
                    "subject": subject,
                })
            );
        }
        SessionAction::Finish { felt, subject } => {
            let active = ctx
                .db
                .active_session(ctx.user.id)?
                .ok_or("no session is running")?;
            let subject = subject.unwrap_or(active.subject);
            let duration = ctx
                .db
                .finish_session(active.id, ctx.user.id, now, &subject, felt)?;

            // The gate makes this a no-op if a finish earlier today already
            // applied the daily update.
            let updater = DailyRankUpdater::new(&ctx.db, &ctx.ladder);
            let rank_update = updater.apply(ctx.user.id, now.date_naive())?;
            if let Some(adv) = &rank_update {
                eprintln!("{}", adv.message);
            }

            let report = FinishReport {
                session_id: active.id,
                duration_minutes: duration,
                subject,
                rank_update,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        SessionAction::Cancel => {
            let active = ctx
                .db
                .active_session(ctx.user.id)?
                .ok_or("no session is running")?;
            ctx.db.cancel_session(active.id, ctx.user.id)?;
            println!("{}", serde_json::json!({ "cancelled": active.id }));
        }
        SessionAction::Status => match ctx.db.active_session(ctx.user.id)? {
            Some(active) => {
                let elapsed = (now - active.started_at).num_minutes();
                println!(
                    "{}",
                    serde_json::json!({
                        "active": true,
                        "session_id": active.id,
                        "subject": active.subject,
                        "started_at": active.started_at.to_rfc3339(),
                        "elapsed_minutes": elapsed,
                    })
                );
            }
            None => println!("{}", serde_json::json!({ "active": false })),
        },
    }
    Ok(())
}
