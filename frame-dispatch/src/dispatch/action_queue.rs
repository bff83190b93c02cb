// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::collections::VecDeque;
use std::fmt;

use crate::dispatch::queue_id::QueueId;

/// A unit of work executed on the main context.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Boxes a closure as an [`Action`], so differently typed closures can share one list.
pub fn action<F>(f: F) -> Action
where
    F: FnOnce() + Send + 'static,
{
    Box::new(f)
}

/// Ordered actions plus the callback fired once they have all run.
///
/// Actions are consumed from the front; an executed action is gone.
pub(crate) struct ActionQueue {
    id: QueueId,
    actions: VecDeque<Action>,
    on_complete: Action,
}

impl ActionQueue {
    pub(crate) fn new<I>(id: QueueId, actions: I, on_complete: Action) -> Self
    where
        I: IntoIterator<Item = Action>,
    {
        Self {
            id,
            actions: actions.into_iter().collect(),
            on_complete,
        }
    }

    pub(crate) fn id(&self) -> QueueId {
        self.id
    }

    pub(crate) fn pop_action(&mut self) -> Option<Action> {
        self.actions.pop_front()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.actions.len()
    }

    pub(crate) fn into_completion(self) -> Action {
        self.on_complete
    }
}

impl fmt::Debug for ActionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionQueue")
            .field("id", &self.id)
            .field("remaining", &self.actions.len())
            .finish()
    }
}
