//! Cancellation by deadline.

use std::time::{Duration, Instant};

/// Error returned when a [`Deadline`] expires.
#[derive(Debug, thiserror::Error)]
#[error("Deadline exceeded during {stage}")]
pub struct Cancelled {
    pub stage: &'static str,
}

/// Overall deadline passed by value to every stage.
///
/// Stages call [`Deadline::check`] between units of work (one node, one page,
/// one file) and stop with [`Cancelled`] once the deadline has passed.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    /// A deadline that never expires.
    #[must_use]
    pub fn none() -> Self {
        Self { expires_at: None }
    }

    /// A deadline `timeout` from now.
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(timeout),
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left, `None` for an unbounded deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Fail with [`Cancelled`] if the deadline has passed.
    pub fn check(&self, stage: &'static str) -> Result<(), Cancelled> {
        if self.is_expired() {
            tracing::warn!(stage, "Deadline exceeded");
            return Err(Cancelled { stage });
        }
        Ok(())
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}
