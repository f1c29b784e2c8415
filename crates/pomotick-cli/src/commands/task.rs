use clap::Subcommand;
use pomotick_core::storage::keys;
use pomotick_core::{Config, Store};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Show the current task
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the task recorded with completed sessions
    Set {
        text: String,
    },
    /// Clear the current task
    Clear,
}

pub fn run(action: TaskAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = Store::open(&config.storage)?;

    match action {
        TaskAction::Show { json } => {
            let task = store.current_task();
            if json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                match task {
                    Some(task) => println!("{}", task.text),
                    None => println!("(no task)"),
                }
            }
        }
        TaskAction::Set { text } => {
            if !store.save_current_task(&text) {
                return Err("task could not be saved".into());
            }
            println!("ok");
        }
        TaskAction::Clear => {
            store.remove(keys::CURRENT_TASK);
            println!("task cleared");
        }
    }
    Ok(())
}
