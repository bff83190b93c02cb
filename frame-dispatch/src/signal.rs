// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Auto-reset event: one waiter is released per [`set`](OneShotSignal::set)
/// and waking consumes the signal.
// pattern is described on https://doc.rust-lang.org/stable/std/sync/struct.Condvar.html
#[derive(Debug, Default)]
pub struct OneShotSignal {
    set: Mutex<bool>,
    cvar: Condvar,
}

impl OneShotSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        let mut set = self.set.lock().unwrap_or_else(PoisonError::into_inner);
        *set = true;
        self.cvar.notify_one();
    }

    pub fn is_set(&self) -> bool {
        *self.set.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the signal is set, then resets it.
    pub fn wait(&self) {
        let mut set = self.set.lock().unwrap_or_else(PoisonError::into_inner);
        while !*set {
            set = self.cvar.wait(set).unwrap_or_else(PoisonError::into_inner);
        }
        *set = false;
    }

    /// Like [`wait`](OneShotSignal::wait), but gives up after `timeout`.
    /// Returns whether the signal was received.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let set = self.set.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut set, _) = self
            .cvar
            .wait_timeout_while(set, timeout, |set| !*set)
            .unwrap_or_else(PoisonError::into_inner);
        if *set {
            *set = false;
            true
        } else {
            false
        }
    }
}
