//! Async driver for [`TimerEngine`].
//!
//! The engine sits behind one mutex and is ticked from a tokio task. User
//! commands go through the same mutex, so there is a single logical actor.
//! Dropping the runner cancels the tick task, which also discards any
//! pending auto-advance.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

use super::engine::{TimerEngine, TimerSnapshot};
use crate::events::Event;

/// User-issued engine commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Reset,
    Skip,
}

pub struct TimerRunner {
    engine: Arc<Mutex<TimerEngine>>,
    events: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TimerRunner {
    /// Spawn the tick loop on the current tokio runtime.
    ///
    /// Every event the engine produces, from ticks or commands, is sent on
    /// the returned channel.
    pub fn spawn(engine: TimerEngine, period: Duration) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let engine = Arc::new(Mutex::new(engine));
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(tick_loop(
            Arc::clone(&engine),
            tx.clone(),
            cancel.clone(),
            period,
        ));
        let runner = Self {
            engine,
            events: tx,
            cancel,
            handle: Some(handle),
        };
        (runner, rx)
    }

    pub fn dispatch(&self, command: Command) -> Option<Event> {
        let event = self.with_engine(|engine| match command {
            Command::Start => engine.start(),
            Command::Pause => engine.pause(),
            Command::Reset => engine.reset(),
            Command::Skip => engine.skip(),
        });
        if let Some(ref event) = event {
            // Receiver may already be gone during shutdown.
            let _ = self.events.send(event.clone());
        }
        event
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut TimerEngine) -> R) -> R {
        f(&mut lock(&self.engine))
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        lock(&self.engine).snapshot()
    }

    /// Send the current snapshot to the event channel as
    /// [`Event::StateSnapshot`] and return it.
    pub fn publish_snapshot(&self) -> TimerSnapshot {
        let snapshot = self.snapshot();
        let _ = self.events.send(Event::StateSnapshot(snapshot.clone()));
        snapshot
    }

    /// Shared handle to the engine, valid after the runner is gone.
    pub fn engine(&self) -> Arc<Mutex<TimerEngine>> {
        Arc::clone(&self.engine)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop ticking and wait for the loop to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "tick loop ended abnormally");
            }
        }
    }
}

impl Drop for TimerRunner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn lock(engine: &Mutex<TimerEngine>) -> MutexGuard<'_, TimerEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn tick_loop(
    engine: Arc<Mutex<TimerEngine>>,
    events: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    period: Duration,
) {
    let mut ticks = interval_at(Instant::now() + period, period);
    tracing::debug!(?period, "tick loop started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticks.tick() => {
                let event = lock(&engine).tick();
                if let Some(event) = event {
                    if events.send(event).is_err() {
                        tracing::trace!("event receiver dropped");
                    }
                }
            }
        }
    }
    tracing::debug!("tick loop stopped");
}
