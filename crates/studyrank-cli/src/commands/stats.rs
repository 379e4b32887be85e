use chrono::Utc;
use clap::Subcommand;

use super::context;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's study totals
    Today,
    /// All-time study totals
    All,
    /// Per-subject breakdown
    Subjects,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = context()?;
    let today = Utc::now().date_naive();

    match action {
        StatsAction::Today => {
            let stats = ctx.db.stats(ctx.user.id, today)?;
            println!(
                "{}",
                serde_json::json!({
                    "today_sessions": stats.today_sessions,
                    "today_minutes": stats.today_minutes,
                })
            );
        }
        StatsAction::All => {
            let stats = ctx.db.stats(ctx.user.id, today)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Subjects => {
            let subjects = ctx.db.stats_by_subject(ctx.user.id)?;
            println!("{}", serde_json::to_string_pretty(&subjects)?);
        }
    }
    Ok(())
}
