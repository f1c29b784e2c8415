use std::sync::{Arc, Mutex, PoisonError};

/// Supplies the current free-text task label when a session completes.
pub trait TaskSource: Send {
    fn current_task(&self) -> String;
}

impl<F> TaskSource for F
where
    F: Fn() -> String + Send,
{
    fn current_task(&self) -> String {
        self()
    }
}

/// Task label shared between the engine and whoever edits it.
#[derive(Debug, Clone, Default)]
pub struct SharedTask(Arc<Mutex<String>>);

impl SharedTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Arc::new(Mutex::new(text.into())))
    }

    pub fn set(&self, text: impl Into<String>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = text.into();
    }

    pub fn get(&self) -> String {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl TaskSource for SharedTask {
    fn current_task(&self) -> String {
        self.get()
    }
}
