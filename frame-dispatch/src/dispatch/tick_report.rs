// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::time::Duration;

use smallvec::SmallVec;

use crate::dispatch::queue_id::QueueId;

/// What a single [`Dispatcher::tick`](crate::Dispatcher::tick) did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub actions_executed: usize,
    /// Queues whose completion callback fired during this tick, in order.
    pub completed: SmallVec<[QueueId; 8]>,
    /// The tick stopped because its budget ran out, with work left over.
    pub yielded: bool,
    pub elapsed: Duration,
}

impl TickReport {
    pub fn queues_completed(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions_executed == 0 && self.completed.is_empty()
    }
}
