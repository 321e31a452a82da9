//! Cancellable delay with a tri-state outcome.
//!
//! [`delay`] sleeps for a timeout, then resolves or rejects according to a
//! [`RejectWith`]. Before sleeping it installs a [`TimerToken`] in the caller's
//! [`DelayHandle`], so the caller can cancel it from outside. The delay never
//! cancels itself.
//!
//! Useful both as a plain delay and to inject failures into code under test,
//! such as a [`guard`](crate::guard)ed task.

use crate::match_value;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, trace};

/// How a delay settles once its timer expires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RejectWith<E> {
    /// Resolve with `()`.
    #[default]
    Resolve,
    /// Reject with no payload.
    Marker,
    /// Reject with the given error.
    Error(E),
}

impl<E> RejectWith<E> {
    /// `true` for [`Resolve`](RejectWith::Resolve).
    #[must_use]
    pub fn is_resolve(&self) -> bool {
        matches!(self, Self::Resolve)
    }

    /// `true` for [`Marker`](RejectWith::Marker).
    #[must_use]
    pub fn is_marker(&self) -> bool {
        matches!(self, Self::Marker)
    }

    /// The rejection this outcome produces, or `None` for `Resolve`.
    #[must_use]
    pub fn into_rejection(self) -> Option<Rejection<E>> {
        match self {
            Self::Resolve => None,
            Self::Marker => Some(Rejection::Marker),
            Self::Error(err) => Some(Rejection::Error(err)),
        }
    }
}

/// `false` resolves, `true` rejects with no payload.
impl<E> From<bool> for RejectWith<E> {
    fn from(reject: bool) -> Self {
        if reject {
            Self::Marker
        } else {
            Self::Resolve
        }
    }
}

/// Why a delay rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection<E> {
    /// Rejected on expiry with no payload.
    #[error("delay rejected")]
    Marker,
    /// Rejected on expiry with a caller-supplied error.
    #[error("delay rejected: {0}")]
    Error(E),
    /// Cancelled through its handle before expiry.
    #[error("delay cancelled")]
    Cancelled,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Handle
// ═══════════════════════════════════════════════════════════════════════════════

/// The timer behind a running delay.
#[derive(Debug, Clone)]
pub struct TimerToken {
    deadline: Instant,
    cancel: Arc<Notify>,
}

impl TimerToken {
    fn new(deadline: Instant) -> Self {
        Self {
            deadline,
            cancel: Arc::new(Notify::new()),
        }
    }

    /// When the timer expires.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before expiry, zero once passed.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Settle the delay early with [`Rejection::Cancelled`].
    ///
    /// Has no effect once the delay has settled.
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }
}

/// Output slot for the timer of the most recent delay started with it.
///
/// Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct DelayHandle {
    timer: Arc<Mutex<Option<TimerToken>>>,
}

impl DelayHandle {
    /// An empty handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The installed timer, if a delay has started.
    #[must_use]
    pub fn timer(&self) -> Option<TimerToken> {
        self.slot().clone()
    }

    /// Cancel the installed timer. Returns `false` if none is installed.
    pub fn cancel(&self) -> bool {
        match self.slot().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn install(&self, token: TimerToken) {
        *self.slot() = Some(token);
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<TimerToken>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Delay
// ═══════════════════════════════════════════════════════════════════════════════

/// Wait `timeout`, then settle as `reject_with` says.
///
/// # Errors
///
/// - [`Rejection::Marker`] for `true` / [`RejectWith::Marker`];
/// - [`Rejection::Error`] for [`RejectWith::Error`];
/// - [`Rejection::Cancelled`] if the timer is cancelled through `handle`.
pub async fn delay<E>(
    timeout: Duration,
    reject_with: impl Into<RejectWith<E>>,
    handle: &DelayHandle,
) -> Result<(), Rejection<E>> {
    let reject_with = reject_with.into();
    let token = TimerToken::new(Instant::now() + timeout);
    let deadline = token.deadline;
    let cancel = Arc::clone(&token.cancel);
    handle.install(token);
    trace!(
        timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        "delay scheduled"
    );

    tokio::select! {
        () = tokio::time::sleep_until(deadline) => {}
        () = cancel.notified() => {
            debug!("delay cancelled");
            return Err(Rejection::Cancelled);
        }
    }

    match_value(reject_with)
        .case(RejectWith::is_resolve, |_| Ok(()))
        .default(|outcome| outcome.into_rejection().map_or(Ok(()), Err))
}

/// Wait `timeout` and resolve.
pub async fn sleep(timeout: Duration) {
    // Nothing else holds the handle, so this can only resolve.
    let _ = delay::<Infallible>(timeout, RejectWith::Resolve, &DelayHandle::new()).await;
}
