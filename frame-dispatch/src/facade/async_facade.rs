// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::{
    fmt, io,
    sync::{Arc, Condvar, Mutex, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};

use log::debug;

use crate::dispatch::action_queue::action;
use crate::dispatch::dispatcher::Dispatcher;
use crate::facade::async_task::AsyncTask;
use crate::signal::OneShotSignal;

#[derive(Clone, Debug, Copy, PartialOrd, Ord, PartialEq, Eq)]
pub enum FacadeState {
    Idle,
    Initialized,
    Started,
    WorkDone,
    Finished,
}

/// Lifecycle of the latest run. Runs superseded by a newer
/// `initialize_and_start` no longer update it.
#[derive(Debug)]
struct RunState {
    generation: u64,
    state: FacadeState,
}

/// Runs an [`AsyncTask`] on a background thread while its `start` and `end`
/// hooks run on the dispatcher's main context.
///
/// The background thread blocks until the main context has executed `start`,
/// so the dispatcher has to keep ticking. Only one background body runs at a
/// time per facade; a second `initialize_and_start` waits for the first.
pub struct AsyncFacade<T: AsyncTask> {
    shared: Arc<Shared<T>>,
    handles: Vec<JoinHandle<()>>,
}

struct Shared<T: AsyncTask> {
    task: T,
    dispatcher: Arc<Dispatcher>,
    signal: Arc<OneShotSignal>,
    run_guard: Mutex<()>,
    sync_state: (Mutex<RunState>, Condvar),
}

impl<T: AsyncTask> AsyncFacade<T> {
    pub fn new(dispatcher: Arc<Dispatcher>, task: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                task,
                dispatcher,
                signal: Arc::new(OneShotSignal::new()),
                run_guard: Mutex::new(()),
                sync_state: (
                    Mutex::new(RunState {
                        generation: 0,
                        state: FacadeState::Idle,
                    }),
                    Condvar::new(),
                ),
            }),
            handles: Vec::new(),
        }
    }

    pub fn task(&self) -> &T {
        &self.shared.task
    }

    /// Runs `initialize` on the calling thread, then spawns the background thread.
    ///
    /// From here on [`state`](AsyncFacade::state) follows this run, even if an
    /// earlier one is still in progress.
    pub fn initialize_and_start(&mut self) -> io::Result<()> {
        self.shared.task.initialize();
        let generation = self.shared.begin_run();

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(format!("facade: {}", self.shared.task.desc()))
            .spawn(move || shared.execute(generation))?;
        self.handles.push(handle);
        Ok(())
    }

    /// State of the most recent run.
    pub fn state(&self) -> FacadeState {
        self.shared.lock_state().state
    }

    pub fn wait_for_state(&self, state: FacadeState) {
        let (_, cvar) = &self.shared.sync_state;
        let mut current_state = self.shared.lock_state();
        while current_state.state < state {
            current_state = cvar
                .wait(current_state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Returns whether `state` was reached within `timeout`.
    pub fn wait_for_state_timeout(&self, state: FacadeState, timeout: Duration) -> bool {
        let (_, cvar) = &self.shared.sync_state;
        let current_state = self.shared.lock_state();
        let (current_state, _) = cvar
            .wait_timeout_while(current_state, timeout, |current| current.state < state)
            .unwrap_or_else(PoisonError::into_inner);
        current_state.state >= state
    }

    /// Joins every background thread spawned so far. Returns the first panic, if any.
    pub fn join(&mut self) -> thread::Result<()> {
        let mut result = Ok(());
        for handle in self.handles.drain(..) {
            let joined = handle.join();
            if result.is_ok() {
                result = joined;
            }
        }
        result
    }
}

impl<T: AsyncTask> Shared<T> {
    fn execute(self: Arc<Self>, generation: u64) {
        let _guard = self.run_guard.lock().unwrap_or_else(PoisonError::into_inner);
        let desc = self.task.desc();

        self.delegate_start();
        self.signal.wait();
        self.set_state(generation, FacadeState::Started);

        debug!("Running background work of {}", desc);
        self.task.run();
        self.set_state(generation, FacadeState::WorkDone);

        let shared = Arc::clone(&self);
        let finished = Arc::clone(&self);
        self.dispatcher.submit_one(
            move || shared.task.end(),
            move || finished.set_state(generation, FacadeState::Finished),
        );
        debug!("Handed end of {} to the dispatcher", desc);
    }

    fn delegate_start(self: &Arc<Self>) {
        if self.task.handles_start() {
            let shared = Arc::clone(self);
            self.dispatcher.submit_signalled(
                [action(move || shared.task.start())],
                Arc::clone(&self.signal),
            );
        } else {
            self.signal.set();
        }
    }

    fn begin_run(&self) -> u64 {
        let (_, cvar) = &self.sync_state;
        let mut current = self.lock_state();
        current.generation += 1;
        current.state = FacadeState::Initialized;
        cvar.notify_all();
        current.generation
    }

    fn set_state(&self, generation: u64, new_state: FacadeState) {
        let (_, cvar) = &self.sync_state;
        let mut current = self.lock_state();
        if current.generation != generation {
            debug!(
                "Run {} of {} superseded, not reporting {:?}",
                generation,
                self.task.desc(),
                new_state
            );
            return;
        }
        current.state = new_state;
        cvar.notify_all();
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RunState> {
        self.sync_state
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: AsyncTask + fmt::Debug> fmt::Debug for AsyncFacade<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFacade")
            .field("task", &self.shared.task)
            .field("state", &self.state())
            .field("threads", &self.handles.len())
            .finish()
    }
}
