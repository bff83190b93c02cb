// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::atomic::Ordering;

use frame_dispatch::TickReport;
use serde::{Deserialize, Serialize};

use crate::workload::WorkloadCounters;

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct RunReport {
    pub frames: u32,

    pub yielded_ticks: u32,

    pub actions_executed: usize,

    pub queues_completed: usize,

    pub queues_cancelled: usize,

    pub max_tick_ms: f64,

    pub total_tick_ms: f64,

    /// Completion callbacks seen by the workers' queues. queues_completed also
    /// counts the warm-up task's start and end queues.
    pub completions_observed: usize,
}

impl RunReport {
    pub fn record_tick(&mut self, tick: &TickReport) {
        let tick_ms = tick.elapsed.as_secs_f64() * 1000.0;
        self.frames += 1;
        self.actions_executed += tick.actions_executed;
        self.queues_completed += tick.queues_completed();
        if tick.yielded {
            self.yielded_ticks += 1;
        }
        self.total_tick_ms += tick_ms;
        if tick_ms > self.max_tick_ms {
            self.max_tick_ms = tick_ms;
        }
    }

    pub fn finish(&mut self, counters: &WorkloadCounters) {
        self.queues_cancelled = counters.queues_cancelled.load(Ordering::Relaxed);
        self.completions_observed = counters.queues_completed.load(Ordering::Relaxed);
    }
}
