// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::{
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use frame_dispatch::{action, Action, Dispatcher};
use log::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct WorkloadCounters {
    pub actions_run: Arc<AtomicUsize>,
    pub queues_completed: Arc<AtomicUsize>,
    pub queues_cancelled: Arc<AtomicUsize>,
}

impl WorkloadCounters {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Shape of the simulated load the workers submit.
#[derive(Debug, Clone)]
pub struct Workload {
    pub workers: usize,
    pub queues_per_worker: usize,
    pub actions_per_queue: usize,
    pub action_cost: Duration,
    pub cancel_every: Option<usize>,
}

impl Workload {
    pub fn spawn(
        &self,
        dispatcher: &Arc<Dispatcher>,
        counters: &WorkloadCounters,
    ) -> io::Result<Vec<JoinHandle<()>>> {
        (0..self.workers)
            .map(|worker| {
                let workload = self.clone();
                let dispatcher = dispatcher.clone();
                let counters = counters.clone();
                thread::Builder::new()
                    .name(format!("worker-{worker}"))
                    .spawn(move || workload.run_worker(worker, &dispatcher, &counters))
            })
            .collect()
    }

    fn run_worker(&self, worker: usize, dispatcher: &Dispatcher, counters: &WorkloadCounters) {
        for n in 0..self.queues_per_worker {
            // odd queues reserve their id first and fill it in later
            let token = (n % 2 == 1).then(|| dispatcher.reserve());

            let actions = self.actions(counters);
            let completed = counters.queues_completed.clone();
            let on_complete = move || {
                completed.fetch_add(1, Ordering::Relaxed);
            };

            let id = match &token {
                Some(token) => match dispatcher.submit_reserved(actions, on_complete, token) {
                    Ok(id) => id,
                    Err(e) => {
                        warn!("worker {worker}: {e}");
                        continue;
                    }
                },
                None => dispatcher.submit(actions, on_complete),
            };
            debug!("worker {worker} submitted {id}");

            let global_index = worker * self.queues_per_worker + n;
            if let Some(every) = self.cancel_every {
                if global_index % every == 0 {
                    let removed = dispatcher.cancel(id);
                    counters.queues_cancelled.fetch_add(removed, Ordering::Relaxed);
                }
            }

            thread::sleep(Duration::from_millis(1));
        }
    }

    fn actions(&self, counters: &WorkloadCounters) -> Vec<Action> {
        (0..self.actions_per_queue)
            .map(|_| {
                let cost = self.action_cost;
                let actions_run = counters.actions_run.clone();
                action(move || {
                    thread::sleep(cost);
                    actions_run.fetch_add(1, Ordering::Relaxed);
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_submitted_queue_either_completes_or_is_cancelled() {
        let dispatcher = Arc::new(Dispatcher::default());
        let counters = WorkloadCounters::new();
        let workload = Workload {
            workers: 3,
            queues_per_worker: 4,
            actions_per_queue: 2,
            action_cost: Duration::ZERO,
            cancel_every: Some(5),
        };

        for handle in workload.spawn(&dispatcher, &counters).unwrap() {
            handle.join().unwrap();
        }
        while !dispatcher.is_idle() {
            dispatcher.tick();
        }

        let completed = counters.queues_completed.load(Ordering::Relaxed);
        let cancelled = counters.queues_cancelled.load(Ordering::Relaxed);
        // indices 0, 5 and 10 are cancelled
        assert_eq!(cancelled, 3);
        assert_eq!(completed + cancelled, 12);
        assert_eq!(counters.actions_run.load(Ordering::Relaxed), completed * 2);
    }
}
