use breatheroom_core::stats::STATS_KEY;
use breatheroom_core::{Database, LocalStore, SessionStats};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Print the persisted statistics record
    Show,
    /// Forget all recorded sessions and streaks
    Reset,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Show => {
            let stats = SessionStats::load(&db);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Reset => {
            db.remove_item(STATS_KEY)?;
            println!("stats reset");
        }
    }
    Ok(())
}
