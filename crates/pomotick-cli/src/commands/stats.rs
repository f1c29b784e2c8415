use clap::Subcommand;
use pomotick_core::stats::{self, StatsReport, StreakSummary};
use pomotick_core::{Config, Store};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// Last seven days
    Week,
    /// Day streaks and the year calendar
    Streak {
        /// Calendar year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Everything the stats view shows
    All,
}

pub fn run(action: StatsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(&config.storage)?;
    let records = store.sessions().to_vec();
    let today = stats::today();

    match action {
        StatsAction::Today => {
            let json = serde_json::json!({
                "date": today,
                "sessions": stats::today_sessions(&records, today).len(),
                "work_sessions": stats::today_work_sessions(&records, today).len(),
                "total_minutes": stats::today_total_minutes(&records, today),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        StatsAction::Week => {
            let json = serde_json::json!({
                "daily": stats::daily_stats(&records, today, 7),
                "work_sessions": stats::weekly_work_sessions(&records, today).len(),
                "total_minutes": stats::weekly_total_minutes(&records, today),
                "average": stats::weekly_average(&records, today),
                "best_day": stats::best_day(&records, today),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        StatsAction::Streak { year } => {
            let summary = match year {
                Some(year) => StreakSummary::build(&records, year, today),
                None => StreakSummary::for_current_year(&records, today),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        StatsAction::All => {
            let report = StatsReport::build(&records, today);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
