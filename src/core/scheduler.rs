//! Named, cancellable scheduled work with a single outstanding instance per
//! purpose.
//!
//! * [`ScheduledTimer`] holds one deadline plus payload (the debounce timer).
//!   Scheduling again replaces the pending deadline instead of queueing.
//! * [`TaskSlot`] holds one in-flight future plus its [`CancellationToken`]
//!   (the refresh and route requests). Starting a new task cancels and drops
//!   the previous one.
//!
//! Both are polled from the session's event loop by mutable reference, so a
//! `tokio::select!` branch that loses the race leaves the pending work intact.

use futures::future::{BoxFuture, FutureExt};
use std::future::{pending, Future};
use tokio::time::{sleep_until, Duration, Instant};
use tokio_util::sync::CancellationToken;

pub struct ScheduledTimer<T> {
    name: &'static str,
    pending: Option<(Instant, T)>,
}

impl<T> ScheduledTimer<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            pending: None,
        }
    }

    /// Schedules `payload` to fire after `delay`. Returns `true` when a
    /// not-yet-fired schedule was replaced.
    pub fn schedule(&mut self, delay: Duration, payload: T) -> bool {
        let replaced = self.pending.is_some();
        self.pending = Some((Instant::now() + delay, payload));
        tracing::trace!("⏱️ {} scheduled in {:?} (replaced: {})", self.name, delay, replaced);
        replaced
    }

    pub fn cancel(&mut self) -> bool {
        let cancelled = self.pending.take().is_some();
        if cancelled {
            tracing::trace!("⏱️ {} cancelled", self.name);
        }
        cancelled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Resolves with the payload once the deadline passes. Never resolves
    /// while nothing is scheduled.
    pub async fn elapsed(&mut self) -> T {
        let Some(deadline) = self.deadline() else {
            return pending().await;
        };
        sleep_until(deadline).await;
        match self.pending.take() {
            Some((_, payload)) => payload,
            None => pending().await,
        }
    }
}

struct InFlight<T> {
    token: CancellationToken,
    future: BoxFuture<'static, T>,
    started: Instant,
}

pub struct TaskSlot<T> {
    name: &'static str,
    current: Option<InFlight<T>>,
}

impl<T> TaskSlot<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            current: None,
        }
    }

    /// Starts a new task, hard-cancelling the one in flight. The closure
    /// receives the token the task must observe.
    pub fn start<F, Fut>(&mut self, make: F) -> bool
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let replaced = self.cancel();
        let token = CancellationToken::new();
        self.current = Some(InFlight {
            future: make(token.clone()).boxed(),
            token,
            started: Instant::now(),
        });
        tracing::trace!("🚀 {} started (replaced: {})", self.name, replaced);
        replaced
    }

    pub fn cancel(&mut self) -> bool {
        match self.current.take() {
            Some(in_flight) => {
                in_flight.token.cancel();
                tracing::debug!(
                    "🛑 {} cancelled after {:?}",
                    self.name,
                    in_flight.started.elapsed()
                );
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.current.is_some()
    }

    /// Resolves with the task's output and clears the slot. Never resolves
    /// while the slot is empty.
    pub async fn settled(&mut self) -> T {
        let output = match self.current.as_mut() {
            Some(in_flight) => (&mut in_flight.future).await,
            None => pending().await,
        };
        if let Some(done) = self.current.take() {
            tracing::trace!("✅ {} settled after {:?}", self.name, done.started.elapsed());
        }
        output
    }
}
