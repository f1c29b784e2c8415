pub mod config;
pub mod data;
pub mod history;
pub mod settings;
pub mod stats;
pub mod task;
pub mod timer;
