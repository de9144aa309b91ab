//! A [`Series`] is the ordered chain of subtasks that makes up one call.
//! Subtasks run strictly in order; a subtask's own code (a
//! handler) may append another subtask to the *same* series it is running
//! in — e.g. an async server handler that defers its reply behind a nested
//! call — which is why [`Series`] is a cheaply-cloneable handle over a
//! shared queue rather than an owned `Vec` consumed by `run`.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::cancel::CancelToken;
use crate::filter::BoxFuture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtaskKind {
    Empty,
    Transport,
    UserDefined,
}

pub struct Subtask {
    kind: SubtaskKind,
    future: BoxFuture<'static, ()>,
}

impl Subtask {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            kind: SubtaskKind::Empty,
            future: Box::pin(async {}),
        }
    }

    pub fn transport<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            kind: SubtaskKind::Transport,
            future: Box::pin(future),
        }
    }

    pub fn user_defined<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            kind: SubtaskKind::UserDefined,
            future: Box::pin(future),
        }
    }

    #[must_use]
    pub fn kind(&self) -> SubtaskKind {
        self.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesOutcome {
    Completed,
    /// The series observed cancellation before its subtasks drained; the
    /// in-flight subtask's future was dropped (aborting any pending I/O).
    Cancelled,
}

/// A cheaply-cloneable handle over a call's subtask queue. All clones share
/// the same underlying queue, so a handler holding a `Series` clone can
/// append work to a series that is concurrently being drained by `run`.
#[derive(Clone, Default)]
pub struct Series {
    queue: Arc<Mutex<VecDeque<Subtask>>>,
}

impl Series {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, subtask: Subtask) {
        self.queue.lock().expect("series queue poisoned").push_back(subtask);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().expect("series queue poisoned").is_empty()
    }

    /// Drains subtasks strictly in order. Returns as soon as the queue is
    /// empty *and* no subtask appended more work, or as soon as `cancel`
    /// fires while a subtask is in flight.
    pub async fn run(&self, cancel: &CancelToken) -> SeriesOutcome {
        loop {
            let next = self.queue.lock().expect("series queue poisoned").pop_front();
            let Some(subtask) = next else {
                return SeriesOutcome::Completed;
            };
            tokio::select! {
                biased;
                () = cancel.cancelled() => return SeriesOutcome::Cancelled,
                () = subtask.future => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::{SeriesOutcome, Subtask};
    use crate::cancel::CancelToken;
    use crate::series::Series;

    #[tokio::test]
    async fn subtasks_run_strictly_in_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let series = Series::new();
        for id in 0..3 {
            let order = order.clone();
            series.push(Subtask::transport(async move {
                order.lock().expect("lock").push(id);
            }));
        }
        let outcome = series.run(&CancelToken::new()).await;
        assert_eq!(outcome, SeriesOutcome::Completed);
        assert_eq!(*order.lock().expect("lock"), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn a_subtask_can_append_another_subtask_to_its_own_series() {
        let counter = Arc::new(AtomicUsize::new(0));
        let series = Series::new();
        let series_clone = series.clone();
        let counter_clone = counter.clone();
        series.push(Subtask::user_defined(async move {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            series_clone.push(Subtask::empty());
        }));

        let outcome = series.run(&CancelToken::new()).await;
        assert_eq!(outcome, SeriesOutcome::Completed);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_aborts_an_in_flight_subtask() {
        let series = Series::new();
        let ran_to_completion = Arc::new(AtomicUsize::new(0));
        let flag = ran_to_completion.clone();
        series.push(Subtask::transport(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            flag.fetch_add(1, Ordering::SeqCst);
        }));

        let cancel = CancelToken::new();
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel_clone.cancel();
        });

        let outcome = series.run(&cancel).await;
        assert_eq!(outcome, SeriesOutcome::Cancelled);
        assert_eq!(ran_to_completion.load(Ordering::SeqCst), 0);
    }
}
