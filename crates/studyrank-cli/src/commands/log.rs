use clap::Subcommand;

use super::context;

#[derive(Subcommand)]
pub enum LogAction {
    /// List recent study log entries, newest first
    List {
        /// Maximum number of entries (defaults to the configured limit)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Delete a log entry by id
    Delete {
        /// Log entry id as shown by `log list`
        id: i64,
    },
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = context()?;

    match action {
        LogAction::List { limit } => {
            let limit = limit.unwrap_or(ctx.config.timer.log_limit);
            let logs = ctx.db.recent_logs(ctx.user.id, limit)?;
            println!("{}", serde_json::to_string_pretty(&logs)?);
        }
        LogAction::Delete { id } => {
            if ctx.db.delete_log(ctx.user.id, id)? {
                println!("{}", serde_json::json!({ "deleted": id }));
            } else {
                return Err(format!("no log entry with id {id}").into());
            }
        }
    }
    Ok(())
}
