use clap::Subcommand;
use pomotick_core::{Config, Store};

#[derive(Subcommand)]
pub enum DataAction {
    /// Delete settings, task, history and session counters
    Reset,
}

pub fn run(action: DataAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = Store::open(&config.storage)?;
    match action {
        DataAction::Reset => {
            store.reset_all();
            println!("all data removed");
        }
    }
    Ok(())
}
