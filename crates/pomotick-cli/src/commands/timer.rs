use std::io::Write;
use std::time::Duration;

use clap::Subcommand;
use pomotick_core::format::format_clock;
use pomotick_core::storage::NotificationsConfig;
use pomotick_core::{
    Command, Config, Event, Notifier, NotifyError, NullNotifier, SharedTask, Store, TimerEngine,
    TimerRunner, TimerState,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the timer in the foreground, reading commands from stdin:
    /// start|pause|reset|skip|status|quit (or s/p/r/n/?/q) and `task <text>`
    Run {
        /// Start the first session immediately
        #[arg(long)]
        autostart: bool,
        /// Exit after this many completed sessions
        #[arg(long)]
        sessions: Option<u32>,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Print the idle timer state as JSON
    Status,
}

/// Terminal bell for sound, stderr line for the popup.
struct TerminalNotifier {
    sound: bool,
    popup: bool,
    volume: f64,
}

impl TerminalNotifier {
    fn new(config: &NotificationsConfig, volume: f64) -> Self {
        Self {
            sound: config.sound,
            popup: config.popup,
            volume,
        }
    }
}

impl Notifier for TerminalNotifier {
    fn request_permission(&mut self) -> Result<bool, NotifyError> {
        Ok(self.popup)
    }

    fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut out = std::io::stderr().lock();
        if self.sound && self.volume > 0.0 {
            write!(out, "\x07")?;
        }
        if self.popup {
            writeln!(out, "{title} {body}")?;
        }
        out.flush()?;
        Ok(())
    }
}

#[derive(Debug)]
enum Input {
    Command(Command),
    /// Replace the task label recorded at completion.
    Task(String),
    Status,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    if let Some((word, rest)) = line.split_once(char::is_whitespace) {
        if matches!(word.to_ascii_lowercase().as_str(), "task" | "t") {
            return Some(Input::Task(rest.trim().to_string()));
        }
    }
    let input = match line.to_ascii_lowercase().as_str() {
        "start" | "s" => Input::Command(Command::Start),
        "pause" | "p" => Input::Command(Command::Pause),
        "reset" | "r" => Input::Command(Command::Reset),
        "skip" | "n" => Input::Command(Command::Skip),
        "status" | "?" => Input::Status,
        "task" | "t" => Input::Task(String::new()),
        "quit" | "q" | "exit" => Input::Quit,
        _ => return None,
    };
    Some(input)
}

fn describe(event: &Event) -> String {
    match event {
        Event::TimerStarted {
            session_type,
            seconds_remaining,
            resumed,
            ..
        } => {
            let verb = if *resumed { "resumed" } else { "started" };
            format!("{} {verb} ({})", session_type.label(), format_clock(*seconds_remaining))
        }
        Event::TimerPaused {
            session_type,
            seconds_remaining,
            ..
        } => format!("{} paused at {}", session_type.label(), format_clock(*seconds_remaining)),
        Event::TimerReset { session_type, .. } => format!("{} reset", session_type.label()),
        Event::TimerSkipped {
            to, session_count, ..
        } => format!("next: {} (work sessions this cycle: {session_count})", to.label()),
        Event::TimerCompleted {
            session_type,
            persisted,
            ..
        } => {
            if *persisted {
                format!("{} complete", session_type.label())
            } else {
                format!("{} complete (not saved)", session_type.label())
            }
        }
        Event::StateSnapshot(snapshot) => format!(
            "{} {:?} {} ({} work sessions this cycle)",
            snapshot.session_type.label(),
            snapshot.state,
            format_clock(snapshot.seconds_remaining),
            snapshot.session_count
        ),
    }
}

pub fn run(action: TimerAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run {
            autostart,
            sessions,
            json,
        } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_foreground(config, autostart, sessions, json))
        }
        TimerAction::Status => {
            let store = Store::open(&config.storage)?;
            let settings = store.settings();
            let engine = TimerEngine::new(settings, store, NullNotifier, String::new);
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
            Ok(())
        }
    }
}

async fn run_foreground(
    config: &Config,
    autostart: bool,
    sessions: Option<u32>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(&config.storage)?;
    let settings = store.settings();
    let task = SharedTask::new(store.current_task().map(|t| t.text).unwrap_or_default());
    let notifier = TerminalNotifier::new(&config.notifications, settings.volume);
    let engine = TimerEngine::new(settings, store, notifier, task.clone())
        .with_auto_advance(config.auto_advance_ticks());

    let period = Duration::from_millis(config.timer.tick_ms.max(1));
    let (runner, mut events) = TimerRunner::spawn(engine, period);
    tracing::debug!(?period, autostart, ?sessions, "foreground timer running");
    if autostart {
        runner.dispatch(Command::Start);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut display = tokio::time::interval(Duration::from_secs(1));
    let mut completed = 0u32;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(event) = events.recv() => {
                if json {
                    println!("{}", serde_json::to_string(&event)?);
                } else {
                    println!("\r{}", describe(&event));
                }
                match event {
                    Event::TimerCompleted { .. } => completed += 1,
                    // Stop only once the advance has saved the counters.
                    Event::TimerSkipped { automatic: true, .. } => {
                        if sessions.is_some_and(|n| completed >= n) {
                            break;
                        }
                    }
                    _ => {}
                }
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match parse_input(&line) {
                    Some(Input::Command(command)) => {
                        runner.dispatch(command);
                    }
                    Some(Input::Task(text)) => {
                        task.set(text.as_str());
                        let saved = runner.with_engine(|engine| engine.store_mut().save_current_task(&text));
                        if !saved {
                            tracing::warn!("task label could not be saved");
                        }
                        if !json {
                            println!("\rtask: {text}");
                        }
                    }
                    Some(Input::Status) => {
                        runner.publish_snapshot();
                    }
                    Some(Input::Quit) => break,
                    None => eprintln!("unknown command: {}", line.trim()),
                },
                None => {
                    tracing::debug!("stdin closed");
                    stdin_open = false;
                }
            },
            _ = display.tick(), if !json => {
                let snap = runner.snapshot();
                if snap.state == TimerState::Running {
                    print!("\r{} {} ", snap.session_type.label(), format_clock(snap.seconds_remaining));
                    std::io::stdout().flush()?;
                }
            }
        }
    }

    runner.shutdown().await;
    Ok(())
}
