//! Concurrency guard — single-flight execution of an async task per lock cell.
//!
//! [`guard`] wraps an async task with a [`LockCell`]. Each [`call`] claims the
//! cell before running the task and releases it on every exit path. A call
//! that finds the cell already claimed is rejected without running the task.
//!
//! # INV: no suspension between read and claim
//!
//! Admission happens on the first poll of the `call` future, before any
//! `.await`, through [`LockCell::try_acquire`]. Two calls racing on one cell
//! can therefore never both observe it free.
//!
//! [`call`]: ConcurrentTask::call

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, warn};

// ═══════════════════════════════════════════════════════════════════════════════
// Lock cell
// ═══════════════════════════════════════════════════════════════════════════════

/// An externally owned boolean used for mutual exclusion.
///
/// `true` means held.
///
/// The default [`try_acquire`](LockCell::try_acquire) reads then writes, which
/// is only race-free when the cell is confined to one thread (`Cell`, `Rc`).
/// `Sync` implementors must override it with an atomic claim, such as a
/// compare-and-swap or a claim made under one lock guard.
pub trait LockCell {
    /// Current state.
    fn get(&self) -> bool;

    /// Overwrite the state.
    fn set(&self, held: bool);

    /// Claim the cell if it is free. Returns `true` on success.
    fn try_acquire(&self) -> bool {
        if self.get() {
            return false;
        }
        self.set(true);
        true
    }
}

impl LockCell for AtomicBool {
    fn get(&self) -> bool {
        self.load(Ordering::Acquire)
    }

    fn set(&self, held: bool) {
        self.store(held, Ordering::Release);
    }

    fn try_acquire(&self) -> bool {
        self.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl LockCell for Cell<bool> {
    fn get(&self) -> bool {
        Cell::get(self)
    }

    fn set(&self, held: bool) {
        Cell::set(self, held);
    }
}

impl LockCell for Mutex<bool> {
    fn get(&self) -> bool {
        *self.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, held: bool) {
        *self.lock().unwrap_or_else(PoisonError::into_inner) = held;
    }

    fn try_acquire(&self) -> bool {
        let mut held = self.lock().unwrap_or_else(PoisonError::into_inner);
        !std::mem::replace(&mut *held, true)
    }
}

impl<L: LockCell + ?Sized> LockCell for &L {
    fn get(&self) -> bool {
        (**self).get()
    }

    fn set(&self, held: bool) {
        (**self).set(held);
    }

    fn try_acquire(&self) -> bool {
        (**self).try_acquire()
    }
}

impl<L: LockCell + ?Sized> LockCell for Arc<L> {
    fn get(&self) -> bool {
        (**self).get()
    }

    fn set(&self, held: bool) {
        (**self).set(held);
    }

    fn try_acquire(&self) -> bool {
        (**self).try_acquire()
    }
}

impl<L: LockCell + ?Sized> LockCell for Rc<L> {
    fn get(&self) -> bool {
        (**self).get()
    }

    fn set(&self, held: bool) {
        (**self).set(held);
    }

    fn try_acquire(&self) -> bool {
        (**self).try_acquire()
    }
}

/// Releases the cell when dropped.
struct Release<'a, L: LockCell + ?Sized>(&'a L);

impl<L: LockCell + ?Sized> Drop for Release<'_, L> {
    fn drop(&mut self) {
        self.0.set(false);
        debug!("lock released");
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Outcome
// ═══════════════════════════════════════════════════════════════════════════════

/// What happened to a guarded call.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<T, E> {
    /// The task ran and succeeded.
    Completed(T),
    /// The cell was held; the task did not run.
    Rejected,
    /// The task failed and the error handler took the error.
    Failed(E),
}

impl<T, E> TaskOutcome<T, E> {
    /// `true` only for [`Completed`](TaskOutcome::Completed).
    pub fn result(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// `true` for [`Rejected`](TaskOutcome::Rejected).
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    /// `true` for [`Failed`](TaskOutcome::Failed).
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The success value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }

    /// The handled error, if any.
    pub fn failed(self) -> Option<E> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Options
// ═══════════════════════════════════════════════════════════════════════════════

type ErrorHandler<E> = Box<dyn Fn(&E) + Send + Sync>;
type RejectHandler = Box<dyn Fn() + Send + Sync>;

/// Guard behavior on rejection and failure.
///
/// Without an error handler, task errors propagate to the caller as `Err`.
pub struct GuardOptions<E> {
    show_error_log: bool,
    show_rejected_reason: bool,
    on_error: Option<ErrorHandler<E>>,
    on_reject: Option<RejectHandler>,
}

impl<E> GuardOptions<E> {
    /// Options with logging off and no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            show_error_log: false,
            show_rejected_reason: false,
            on_error: None,
            on_reject: None,
        }
    }

    /// Emit an `error` event before calling the error handler.
    #[must_use]
    pub fn show_error_log(mut self, enabled: bool) -> Self {
        self.show_error_log = enabled;
        self
    }

    /// Emit a `warn` event when a call is rejected.
    #[must_use]
    pub fn show_rejected_reason(mut self, enabled: bool) -> Self {
        self.show_rejected_reason = enabled;
        self
    }

    /// Swallow task errors into [`TaskOutcome::Failed`] after calling `handler`.
    #[must_use]
    pub fn on_error(mut self, handler: impl Fn(&E) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Call `handler` whenever a call is rejected.
    #[must_use]
    pub fn on_reject(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_reject = Some(Box::new(handler));
        self
    }
}

impl<E> Default for GuardOptions<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for GuardOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardOptions")
            .field("show_error_log", &self.show_error_log)
            .field("show_rejected_reason", &self.show_rejected_reason)
            .field("has_on_error", &self.on_error.is_some())
            .field("has_on_reject", &self.on_reject.is_some())
            .finish()
    }
}

/// The serializable part of [`GuardOptions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GuardConfig {
    /// See [`GuardOptions::show_error_log`].
    pub show_error_log: bool,
    /// See [`GuardOptions::show_rejected_reason`].
    pub show_rejected_reason: bool,
}

impl<E> From<GuardConfig> for GuardOptions<E> {
    fn from(config: GuardConfig) -> Self {
        Self::new()
            .show_error_log(config.show_error_log)
            .show_rejected_reason(config.show_rejected_reason)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Guard
// ═══════════════════════════════════════════════════════════════════════════════

/// Wrap `task` so that at most one call runs per `lock` at a time.
///
/// ```
/// use casewise::{guard, GuardOptions};
/// use std::sync::atomic::AtomicBool;
///
/// # tokio_test_block_on(async {
/// let busy = AtomicBool::new(false);
/// let task = guard(
///     |n: u32| async move { Ok::<_, String>(n * 2) },
///     &busy,
///     GuardOptions::default(),
/// );
///
/// let outcome = task.call(21).await.unwrap();
/// assert_eq!(outcome.completed(), Some(42));
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub fn guard<F, L, E>(task: F, lock: L, options: GuardOptions<E>) -> ConcurrentTask<F, L, E>
where
    L: LockCell,
{
    ConcurrentTask {
        task,
        lock,
        options,
    }
}

/// A task wrapped by [`guard`].
pub struct ConcurrentTask<F, L, E> {
    task: F,
    lock: L,
    options: GuardOptions<E>,
}

impl<F, L, E> ConcurrentTask<F, L, E>
where
    L: LockCell,
{
    /// Run the task if the cell is free.
    ///
    /// - cell held: `Ok(Rejected)`, the task is not invoked;
    /// - task succeeded: `Ok(Completed(value))`;
    /// - task failed with an error handler: `Ok(Failed(err))`;
    /// - task failed without one: `Err(err)`.
    ///
    /// The cell is released on every exit path, including a panic in the task
    /// and dropping this future before it completes.
    ///
    /// # Errors
    ///
    /// Returns the task's error when no error handler is configured.
    pub async fn call<A, Fut, T>(&self, args: A) -> Result<TaskOutcome<T, E>, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        if !self.lock.try_acquire() {
            if self.options.show_rejected_reason {
                warn!("task rejected: lock is held by an in-flight call");
            }
            if let Some(on_reject) = &self.options.on_reject {
                on_reject();
            }
            return Ok(TaskOutcome::Rejected);
        }

        let _release = Release(&self.lock);
        debug!("lock acquired");

        match (self.task)(args).await {
            Ok(value) => Ok(TaskOutcome::Completed(value)),
            Err(err) => match &self.options.on_error {
                Some(on_error) => {
                    if self.options.show_error_log {
                        error!(error = %err, "guarded task failed");
                    }
                    on_error(&err);
                    Ok(TaskOutcome::Failed(err))
                }
                None => Err(err),
            },
        }
    }

    /// Whether a call currently holds the cell.
    pub fn is_busy(&self) -> bool {
        self.lock.get()
    }

    /// The cell this task is guarded by.
    pub fn lock(&self) -> &L {
        &self.lock
    }
}

impl<F, L: fmt::Debug, E> fmt::Debug for ConcurrentTask<F, L, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentTask")
            .field("lock", &self.lock)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
