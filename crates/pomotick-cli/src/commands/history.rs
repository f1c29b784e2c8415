use chrono::Utc;
use clap::Subcommand;
use pomotick_core::format::format_minutes;
use pomotick_core::{Config, SessionRecord, Store};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List completed sessions, newest first
    List {
        /// Maximum number of sessions to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove sessions older than the prune age
    Prune {
        /// Age in days (defaults to storage.prune_after_days)
        #[arg(long)]
        days: Option<i64>,
    },
}

pub fn run(action: HistoryAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(&config.storage)?;

    match action {
        HistoryAction::List { limit, json } => {
            let log = store.sessions();
            let recent: Vec<&SessionRecord> = log.iter().rev().take(limit).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&recent)?);
            } else if recent.is_empty() {
                println!("No sessions yet.");
            } else {
                for record in recent {
                    println!(
                        "{}  {:<11}  {:>8}  {}",
                        record.completed_at.format("%Y-%m-%d %H:%M"),
                        record.session_type.label(),
                        format_minutes(record.duration_min),
                        record.task
                    );
                }
            }
        }
        HistoryAction::Prune { days } => {
            let days = days.unwrap_or(config.storage.prune_after_days);
            let mut store = store.with_limits(config.storage.history_limit, days);
            let removed = store.clean_old_sessions(Utc::now());
            println!("removed {removed} sessions older than {days} days");
        }
    }
    Ok(())
}
