use clap::Subcommand;
use pomotick_core::{Config, Settings, Store};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print current settings as JSON
    Show,
    /// Get a single setting
    Get {
        /// Field name (e.g. "work_duration", "volume")
        key: String,
    },
    /// Change a setting; out-of-range values are rejected
    Set {
        key: String,
        value: String,
    },
    /// Restore default durations and volume
    Reset,
}

pub fn run(action: SettingsAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = Store::open(&config.storage)?;
    let settings = store.settings();

    match action {
        SettingsAction::Show => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Get { key } => match settings.field(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown setting: {key}").into()),
        },
        SettingsAction::Set { key, value } => {
            let updated = settings.with_field(&key, &value)?;
            if !store.save_settings(&updated) {
                return Err("settings could not be saved".into());
            }
            println!("ok");
        }
        SettingsAction::Reset => {
            if !store.save_settings(&Settings::default()) {
                return Err("settings could not be saved".into());
            }
            println!("settings reset to defaults");
        }
    }
    Ok(())
}
