//! Timing wrapper — measure and log how long an async task takes.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, info_span, Instrument};

/// Wrap `task` so every call is timed and logged under `label`.
///
/// Each call opens an `info` span carrying the label, emits a `debug` event on
/// start and an `info` event with `elapsed_ms` on finish.
pub fn record_time<F>(task: F, label: impl Into<String>) -> Recorded<F> {
    Recorded {
        task,
        label: label.into(),
    }
}

/// A task wrapped by [`record_time`].
#[derive(Debug, Clone)]
pub struct Recorded<F> {
    task: F,
    label: String,
}

/// Output of [`Recorded::call_timed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timed<T> {
    /// What the task returned.
    pub result_data: T,
    /// Wall time spent in the task.
    pub elapsed: Duration,
    /// The label the task was recorded under.
    pub label: String,
}

impl<F> Recorded<F> {
    /// Run the task and return its output unchanged.
    pub async fn call<A, Fut>(&self, args: A) -> Fut::Output
    where
        F: Fn(A) -> Fut,
        Fut: Future,
    {
        self.call_timed(args).await.result_data
    }

    /// Run the task and return its output with the elapsed time.
    pub async fn call_timed<A, Fut>(&self, args: A) -> Timed<Fut::Output>
    where
        F: Fn(A) -> Fut,
        Fut: Future,
    {
        let span = info_span!("record_time", label = %self.label);
        async {
            debug!("started");
            let start = Instant::now();
            let result_data = (self.task)(args).await;
            let elapsed = start.elapsed();
            let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
            info!(elapsed_ms, "finished");
            Timed {
                result_data,
                elapsed,
                label: self.label.clone(),
            }
        }
        .instrument(span)
        .await
    }

    /// The label calls are logged under.
    pub fn label(&self) -> &str {
        &self.label
    }
}
