//! Notification collaborator.
//!
//! Delivery (sound, popup) lives outside the core. The engine only calls
//! this trait and never lets a failure change timer state.

use crate::error::NotifyError;

pub trait Notifier: Send {
    /// Ask for permission to show popups. Safe to call repeatedly.
    fn request_permission(&mut self) -> Result<bool, NotifyError>;

    /// Best-effort completion alert.
    fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Notifier that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn request_permission(&mut self) -> Result<bool, NotifyError> {
        Ok(false)
    }

    fn notify(&mut self, _title: &str, _body: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}
