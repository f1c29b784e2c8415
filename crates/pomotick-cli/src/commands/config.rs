use clap::Subcommand;
use pomotick_core::{Config, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value by dot path (e.g. "storage.history_limit")
    Get { key: String },
    /// Change one value; "none" clears optional keys such as storage.max_pages
    Set { key: String, value: String },
    /// Print every key as `dot.path = value`
    List {
        /// Print the whole file as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Write the default config file
    Reset,
}

fn known_keys(config: &Config) -> String {
    config
        .entries()
        .into_iter()
        .map(|(key, _)| key)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match action {
        ConfigAction::Reset => Config::default(),
        _ => Config::load()?,
    };

    match action {
        ConfigAction::Get { key } => {
            let value = config.get(&key).ok_or_else(|| {
                tracing::debug!(known = %known_keys(&config), "config key lookup failed");
                ConfigError::UnknownKey(key.clone())
            })?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            if let Err(e) = config.set(&key, &value) {
                if matches!(e, ConfigError::UnknownKey(_)) {
                    eprintln!("known keys: {}", known_keys(&config));
                }
                return Err(e.into());
            }
            println!("{key} = {}", config.get(&key).unwrap_or_default());
        }
        ConfigAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                for (key, value) in config.entries() {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset => {
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
