use chrono::Utc;
use clap::Subcommand;
use studyrank_core::tier::DailyRankUpdater;

use super::context;

#[derive(Subcommand)]
pub enum RankAction {
    /// Current tier, rank point and band
    Show,
    /// Run today's rank update now (no-op if already applied today)
    Apply,
    /// Print the full tier ladder
    Ladder,
}

pub fn run(action: RankAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = context()?;

    match action {
        RankAction::Show => {
            let prog = ctx.db.user_progression(ctx.user.id)?;
            let def = ctx
                .ladder
                .get(prog.tier)
                .ok_or("persisted tier is outside the configured ladder")?;
            println!(
                "{}",
                serde_json::json!({
                    "username": ctx.user.username,
                    "tier": prog.tier,
                    "tier_name": def.name.clone(),
                    "rank_point": prog.rank_point,
                    "band": { "floor": def.floor, "ceiling": def.ceiling },
                    "daily_required": def.daily_required,
                    "last_applied": prog.last_applied,
                })
            );
        }
        RankAction::Apply => {
            let updater = DailyRankUpdater::new(&ctx.db, &ctx.ladder);
            match updater.apply(ctx.user.id, Utc::now().date_naive())? {
                Some(adv) => println!("{}", serde_json::to_string_pretty(&adv)?),
                None => println!("{}", serde_json::json!({ "applied": false, "reason": "already applied today" })),
            }
        }
        RankAction::Ladder => {
            println!("{}", serde_json::to_string_pretty(ctx.ladder.tiers())?);
        }
    }
    Ok(())
}
