// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use frame_dispatch::{action, Action, ManualClock};

use crate::trace_log::{TraceEvent, TraceLog};

/// Records which action or completion ran, on which thread and in which tick.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<TraceEvent>>>,
    tick: Arc<AtomicU32>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tick(&self, tick: u32) {
        self.tick.store(tick, Ordering::SeqCst);
    }

    pub fn record(&self, label: &str) {
        let thread = thread::current()
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{:?}", thread::current().id()));
        self.events.lock().unwrap().push(TraceEvent {
            label: label.to_string(),
            tick: self.tick.load(Ordering::SeqCst),
            thread,
        });
    }

    pub fn action(&self, label: impl Into<String>) -> Action {
        let recorder = self.clone();
        let label = label.into();
        action(move || recorder.record(&label))
    }

    /// Records itself and moves `clock` forward by `cost`.
    pub fn costly_action(&self, label: impl Into<String>, clock: &ManualClock, cost: Duration) -> Action {
        let recorder = self.clone();
        let clock = clock.clone();
        let label = label.into();
        action(move || {
            recorder.record(&label);
            clock.advance(cost);
        })
    }

    pub fn actions(&self, prefix: &str, count: usize) -> Vec<Action> {
        (1..=count).map(|i| self.action(format!("{prefix}{i}"))).collect()
    }

    pub fn completion(&self, label: impl Into<String>) -> impl FnOnce() + Send + 'static {
        let recorder = self.clone();
        let label = label.into();
        move || recorder.record(&label)
    }

    pub fn trace(&self) -> TraceLog {
        TraceLog {
            events: self.events.lock().unwrap().clone(),
        }
    }

    pub fn count(&self, label: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.label == label)
            .count()
    }
}
