//! Guard and delay behavior observed through `ObservedLock`
//!
//! All tests run on a paused clock, so the timeouts cost nothing.

use casewise::{delay, guard, sleep, DelayHandle, GuardOptions, RejectWith, Rejection};
use casewise_test::ObservedLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Sleeps `n` ms, then completes with `n`.
async fn wait(n: u64) -> Result<u64, String> {
    sleep(ms(n)).await;
    Ok(n)
}

/// Fails with `err` after `n` ms.
async fn reject_after((n, err): (u64, String)) -> Result<(), Rejection<String>> {
    delay(ms(n), RejectWith::Error(err), &DelayHandle::new()).await
}

#[tokio::test(start_paused = true)]
async fn test_sequential_calls_are_both_admitted() {
    let lock = Arc::new(ObservedLock::new());
    let task = guard(wait, Arc::clone(&lock), GuardOptions::new());

    let first = task.call(2000).await.unwrap();
    assert!(first.result());
    assert_eq!(first.completed(), Some(2000));

    let second = task.call(1000).await.unwrap();
    assert!(second.result());

    assert_eq!(lock.history(), [true, false, true, false]);
    assert_eq!(lock.acquisitions(), 2);
    assert_eq!(lock.rejections(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_call_on_shared_lock_is_rejected() {
    let lock = Arc::new(ObservedLock::new());
    let rejected_while_held = Arc::new(AtomicUsize::new(0));

    let plain = guard(wait, Arc::clone(&lock), GuardOptions::new());
    let watched = guard(
        wait,
        Arc::clone(&lock),
        GuardOptions::new().show_rejected_reason(true).on_reject({
            let lock = Arc::clone(&lock);
            let seen = Arc::clone(&rejected_while_held);
            move || {
                if casewise::LockCell::get(&*lock) {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
            }
        }),
    );

    let (long, short) = tokio::join!(plain.call(2000), watched.call(1000));

    assert_eq!(long.unwrap().completed(), Some(2000));
    assert!(short.unwrap().is_rejected());
    assert_eq!(rejected_while_held.load(Ordering::SeqCst), 1);

    // The rejected call never touched the cell.
    assert_eq!(lock.history(), [true, false]);
    assert_eq!(lock.rejections(), 1);
    assert!(!plain.is_busy());
}

#[tokio::test(start_paused = true)]
async fn test_handled_and_unhandled_errors() {
    let handled_lock = Arc::new(ObservedLock::new());
    let unhandled_lock = Arc::new(ObservedLock::new());
    let handled = Arc::new(AtomicUsize::new(0));

    let with_handler = guard(
        reject_after,
        Arc::clone(&handled_lock),
        GuardOptions::new().show_error_log(true).on_error({
            let handled = Arc::clone(&handled);
            move |err: &Rejection<String>| {
                assert_eq!(*err, Rejection::Error("test1".to_owned()));
                handled.fetch_add(1, Ordering::SeqCst);
            }
        }),
    );
    let without_handler = guard(
        reject_after,
        Arc::clone(&unhandled_lock),
        GuardOptions::new(),
    );

    let (first, second) = tokio::join!(
        with_handler.call((1000, "test1".to_owned())),
        without_handler.call((1000, "test2".to_owned())),
    );

    // Handled: resolves with the failure, handler ran once.
    let outcome = first.unwrap();
    assert!(outcome.is_failed());
    assert!(!outcome.result());
    assert_eq!(handled.load(Ordering::SeqCst), 1);

    // Unhandled: the error propagates to the caller.
    assert_eq!(second.unwrap_err(), Rejection::Error("test2".to_owned()));

    // Both locks are released either way.
    assert_eq!(handled_lock.history(), [true, false]);
    assert_eq!(unhandled_lock.history(), [true, false]);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_delay_releases_lock_through_error() {
    let lock = Arc::new(ObservedLock::new());
    let handle = Arc::new(DelayHandle::new());

    let task = guard(
        {
            let handle = Arc::clone(&handle);
            move |n: u64| {
                let handle = Arc::clone(&handle);
                async move { delay::<String>(ms(n), false, &handle).await }
            }
        },
        Arc::clone(&lock),
        GuardOptions::new(),
    );

    let canceller = async {
        sleep(ms(10)).await;
        assert!(handle.cancel());
    };

    let (outcome, ()) = tokio::join!(task.call(5000), canceller);

    assert_eq!(outcome.unwrap_err(), Rejection::Cancelled);
    assert_eq!(lock.history(), [true, false]);
}

#[tokio::test(start_paused = true)]
async fn test_delay_marker_rejection() {
    let start = tokio::time::Instant::now();
    let result = delay::<String>(ms(1000), true, &DelayHandle::new()).await;

    assert_eq!(result, Err(Rejection::Marker));
    assert!(start.elapsed() >= ms(1000));
}
