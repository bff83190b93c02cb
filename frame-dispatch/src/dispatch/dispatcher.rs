// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::{
    collections::VecDeque,
    fmt,
    future::Future,
    panic::{self, AssertUnwindSafe},
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
    time::Duration,
};

use futures::channel::oneshot;
use log::{debug, error, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{BudgetMode, DispatcherConfig, PanicPolicy, DEFAULT_MAX_TICK_BUDGET_SECONDS};
use crate::dispatch::action_queue::{action, Action, ActionQueue};
use crate::dispatch::queue_id::{IdAllocator, QueueId};
use crate::dispatch::reservation::{DispatcherInstance, ReservationToken};
use crate::dispatch::tick_report::TickReport;
use crate::error::{ConfigError, DispatchError};
use crate::signal::OneShotSignal;

/// Runs queues of actions submitted from any thread on the one thread that
/// calls [`tick`](Dispatcher::tick).
///
/// Share it between producers with an `Arc`. The queue lock is never held
/// while an action or completion callback runs, so actions may submit to or
/// cancel on the same dispatcher.
pub struct Dispatcher {
    instance: DispatcherInstance,
    config: DispatcherConfig,
    max_tick_budget: Duration,
    clock: Arc<dyn Clock>,
    created_at: Duration,
    ids: IdAllocator,
    queues: Mutex<VecDeque<ActionQueue>>,
}

enum Step {
    Run(QueueId, Action),
    Complete(ActionQueue),
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: DispatcherConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let max_tick_budget = config.max_tick_budget()?;
        Ok(Self::assemble(config, max_tick_budget, clock))
    }

    fn assemble(config: DispatcherConfig, max_tick_budget: Duration, clock: Arc<dyn Clock>) -> Self {
        let created_at = clock.now();
        Self {
            instance: DispatcherInstance::next(),
            config,
            max_tick_budget,
            clock,
            created_at,
            ids: IdAllocator::new(),
            queues: Mutex::new(VecDeque::new()),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Appends a queue with a fresh id. Safe to call from any thread.
    pub fn submit<I, F>(&self, actions: I, on_complete: F) -> QueueId
    where
        I: IntoIterator<Item = Action>,
        F: FnOnce() + Send + 'static,
    {
        let id = self.ids.next();
        let queue = ActionQueue::new(id, actions, Box::new(on_complete));
        let mut queues = self.lock_queues();
        debug!("Queued {} with {} action(s)", id, queue.remaining());
        queues.push_back(queue);
        id
    }

    /// Appends a queue under an id reserved earlier with [`reserve`](Dispatcher::reserve).
    ///
    /// A token can only be redeemed once. On error nothing is enqueued.
    pub fn submit_reserved<I, F>(
        &self,
        actions: I,
        on_complete: F,
        token: &ReservationToken,
    ) -> Result<QueueId, DispatchError>
    where
        I: IntoIterator<Item = Action>,
        F: FnOnce() + Send + 'static,
    {
        let id = token.id();
        if token.issuer() != self.instance {
            warn!("Rejected reservation {}: issued by another dispatcher", id);
            return Err(DispatchError::ForeignReservation { id });
        }
        let queue = ActionQueue::new(id, actions, Box::new(on_complete));
        let mut queues = self.lock_queues();
        if let Err(e) = token.mark_used() {
            warn!("Rejected reservation {}: already used", id);
            return Err(e);
        }
        debug!("Queued reserved {} with {} action(s)", id, queue.remaining());
        queues.push_back(queue);
        Ok(id)
    }

    /// Reserves a queue id for a later [`submit_reserved`](Dispatcher::submit_reserved).
    pub fn reserve(&self) -> ReservationToken {
        let token = ReservationToken::new(self.ids.next(), self.instance);
        debug!("Reserved {}", token.id());
        token
    }

    pub fn submit_one<A, F>(&self, main_thread_action: A, on_complete: F) -> QueueId
    where
        A: FnOnce() + Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        self.submit([action(main_thread_action)], on_complete)
    }

    /// Fire-and-forget single action.
    pub fn post<A>(&self, main_thread_action: A) -> QueueId
    where
        A: FnOnce() + Send + 'static,
    {
        self.submit_one(main_thread_action, || {})
    }

    /// Submits a queue whose completion sets `signal`, for callers that block
    /// until the main context has run their actions.
    pub fn submit_signalled<I>(&self, actions: I, signal: Arc<OneShotSignal>) -> QueueId
    where
        I: IntoIterator<Item = Action>,
    {
        self.submit(actions, move || signal.set())
    }

    /// Submits a queue and returns a future resolving once it completes.
    ///
    /// The future resolves to `Err(Canceled)` if the queue is cancelled or the
    /// dispatcher is dropped first.
    pub fn submit_awaitable<I>(&self, actions: I) -> (QueueId, QueueCompletion)
    where
        I: IntoIterator<Item = Action>,
    {
        let (tx, rx) = oneshot::channel();
        let id = self.submit(actions, move || {
            // the receiver may have been dropped; nobody is waiting then
            let _ = tx.send(());
        });
        (id, QueueCompletion { rx })
    }

    /// Removes every queue with the given id without firing its completion.
    ///
    /// An action that is currently running still finishes. Returns the number
    /// of queues removed.
    pub fn cancel(&self, queue_id: QueueId) -> usize {
        let removed = {
            let mut queues = self.lock_queues();
            let mut removed = Vec::new();
            let mut i = 0;
            while i < queues.len() {
                if queues[i].id() == queue_id {
                    removed.extend(queues.remove(i));
                } else {
                    i += 1;
                }
            }
            removed
        };
        // dropped outside the lock, captured state may run arbitrary Drop code
        let count = removed.len();
        drop(removed);
        if count > 0 {
            debug!("Cancelled {} ({} queue(s))", queue_id, count);
        }
        count
    }

    /// Drains queued work until everything ran or the budget is spent.
    ///
    /// Must only be called from the main context, never concurrently with
    /// itself. The budget is checked after every action; a yielded tick leaves
    /// the front queue in place and the next tick continues with its next
    /// action.
    pub fn tick(&self) -> TickReport {
        let tick_start = self.clock.now();
        let budget_origin = match self.config.budget_mode {
            BudgetMode::PerTick => tick_start,
            BudgetMode::SinceStart => self.created_at,
        };
        let mut report = TickReport::default();

        loop {
            let step = {
                let mut queues = self.lock_queues();
                let Some(front) = queues.front_mut() else {
                    break;
                };
                let id = front.id();
                match front.pop_action() {
                    Some(next) => Step::Run(id, next),
                    None => match queues.pop_front() {
                        Some(done) => Step::Complete(done),
                        None => break,
                    },
                }
            };

            match step {
                Step::Run(id, next) => {
                    trace!("Running action of {}", id);
                    self.invoke(id, "action", next);
                    report.actions_executed += 1;
                    if self.clock.now().saturating_sub(budget_origin) > self.max_tick_budget {
                        report.yielded = !self.is_idle();
                        break;
                    }
                }
                Step::Complete(done) => {
                    let id = done.id();
                    self.invoke(id, "completion", done.into_completion());
                    debug!("Completed {}", id);
                    report.completed.push(id);
                }
            }
        }

        report.elapsed = self.clock.now().saturating_sub(tick_start);
        if report.yielded {
            trace!(
                "Tick yielded after {} action(s), {:?}",
                report.actions_executed,
                report.elapsed
            );
        }
        report
    }

    pub fn pending_queues(&self) -> usize {
        self.lock_queues().len()
    }

    pub fn pending_actions(&self, queue_id: QueueId) -> Option<usize> {
        self.lock_queues()
            .iter()
            .find(|queue| queue.id() == queue_id)
            .map(|queue| queue.remaining())
    }

    pub fn contains(&self, queue_id: QueueId) -> bool {
        self.lock_queues().iter().any(|queue| queue.id() == queue_id)
    }

    pub fn is_idle(&self) -> bool {
        self.lock_queues().is_empty()
    }

    fn invoke(&self, id: QueueId, what: &str, f: Action) {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(()) => {}
            Err(payload) => match self.config.panic_policy {
                PanicPolicy::Isolate => {
                    error!(
                        "{} of {} panicked: {}",
                        what,
                        id,
                        panic_message(payload.as_ref())
                    );
                }
                PanicPolicy::Propagate => {
                    warn!("{} of {} panicked, abandoning this tick", what, id);
                    panic::resume_unwind(payload);
                }
            },
        }
    }

    // user code never runs under this lock, so a poisoned lock still holds consistent data
    fn lock_queues(&self) -> MutexGuard<'_, VecDeque<ActionQueue>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::assemble(
            DispatcherConfig::default(),
            Duration::from_secs_f64(DEFAULT_MAX_TICK_BUDGET_SECONDS),
            Arc::new(SystemClock::new()),
        )
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("pending_queues", &self.pending_queues())
            .finish()
    }
}

/// Resolves when a queue submitted with
/// [`Dispatcher::submit_awaitable`] has completed.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct QueueCompletion {
    rx: oneshot::Receiver<()>,
}

impl Future for QueueCompletion {
    type Output = Result<(), oneshot::Canceled>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
