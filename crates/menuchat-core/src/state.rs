//! UI-agnostic presentation state
//!
//! Pieces of front-end behavior that don't depend on a particular UI
//! framework, kept here so they can be tested without one.

use std::time::{Duration, Instant};

/// How long the "copied" acknowledgment stays up after a copy
pub const COPY_ACK_DURATION: Duration = Duration::from_secs(2);

/// Transient acknowledgment shown after the response is copied to the clipboard
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyFeedback {
    copied_at: Option<Instant>,
}

impl CopyFeedback {
    pub fn mark(&mut self, now: Instant) {
        self.copied_at = Some(now);
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.copied_at
            .map(|at| now.saturating_duration_since(at) < COPY_ACK_DURATION)
            .unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.copied_at = None;
    }
}
