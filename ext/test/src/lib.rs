//! casewise-test: test doubles and conformance fixtures
//!
//! Provides [`ObservedLock`], a [`LockCell`] that records every transition,
//! and (with the `fixtures` feature) a runner for the YAML fixtures under
//! `spec/tests/`.
//!
//! # Example
//!
//! ```
//! use casewise::LockCell;
//! use casewise_test::ObservedLock;
//!
//! let lock = ObservedLock::new();
//! assert!(lock.try_acquire());
//! assert!(!lock.try_acquire());
//! lock.set(false);
//!
//! assert_eq!(lock.history(), [true, false]);
//! assert_eq!(lock.rejections(), 1);
//! ```

use casewise::LockCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

#[cfg(feature = "fixtures")]
pub mod fixture;

/// A lock cell that records what the guard does to it.
///
/// Claims use compare-and-swap, like `AtomicBool`. Every state written by a
/// successful claim or by `set` is appended to [`history`](Self::history).
#[derive(Debug, Default)]
pub struct ObservedLock {
    held: AtomicBool,
    history: Mutex<Vec<bool>>,
    acquisitions: AtomicUsize,
    rejections: AtomicUsize,
}

impl ObservedLock {
    /// A free lock with empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// States written so far, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<bool> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of successful claims.
    #[must_use]
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Number of claims that found the lock held.
    #[must_use]
    pub fn rejections(&self) -> usize {
        self.rejections.load(Ordering::SeqCst)
    }

    fn record(&self, held: bool) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(held);
    }
}

impl LockCell for ObservedLock {
    fn get(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    fn set(&self, held: bool) {
        self.held.store(held, Ordering::SeqCst);
        self.record(held);
    }

    fn try_acquire(&self) -> bool {
        let claimed = self
            .held
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if claimed {
            self.acquisitions.fetch_add(1, Ordering::SeqCst);
            self.record(true);
        } else {
            self.rejections.fetch_add(1, Ordering::SeqCst);
        }
        claimed
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::ObservedLock;
    pub use casewise::prelude::*;

    #[cfg(feature = "fixtures")]
    pub use crate::fixture::{CaseResult, Fixture, SuiteKind};
}
