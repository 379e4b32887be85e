pub mod config;
pub mod log;
pub mod rank;
pub mod session;
pub mod stats;

use studyrank_core::storage::{Config, Database};
use studyrank_core::tier::TierLadder;
use studyrank_core::UserRecord;

/// Everything a command needs: config, the validated ladder, the database
/// and the resolved local user.
pub struct Context {
    pub config: Config,
    pub ladder: TierLadder,
    pub db: Database,
    pub user: UserRecord,
}

/// Load config, validate the ladder, open the database and resolve the
/// configured profile. An invalid custom ladder fails here, before any
/// command logic runs.
pub fn context() -> Result<Context, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let ladder = config.tier_ladder()?;
    let db = Database::open()?;
    let user = db.find_or_create_user(&config.profile.username)?;
    Ok(Context {
        config,
        ladder,
        db,
        user,
    })
}
