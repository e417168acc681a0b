//! User-facing notifications.
//!
//! The pipeline emits exactly one terminal notification per export
//! (success or error) plus an informational one when work starts. The
//! trait has no-op defaults so implementations only override what they
//! surface.

use std::fmt;
use tracing::{error, info};

/// Receives transient user-facing messages from the export pipeline.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, _message: &str) {}
    fn notify_error(&self, _message: &str) {}
    fn notify_info(&self, _message: &str) {}
}

impl fmt::Debug for dyn Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Notifier")
    }
}

/// Default notifier: routes messages to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_success(&self, message: &str) {
        info!("{}", message);
    }

    fn notify_error(&self, message: &str) {
        error!("{}", message);
    }

    fn notify_info(&self, message: &str) {
        info!("{}", message);
    }
}

/// Discards every notification. Useful for embedding and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {}
