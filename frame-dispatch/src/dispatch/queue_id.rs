// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::fmt;
use std::sync::atomic::{AtomicI16, Ordering};

/// Identifier of a queue held by a dispatcher.
///
/// Ids are 16 bit and wrap around, so an id is only unique among the queues
/// a dispatcher currently holds, not over the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueId(i16);

impl QueueId {
    pub fn get(self) -> i16 {
        self.0
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out queue and reservation ids for one dispatcher.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: AtomicI16,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        Self {
            next: AtomicI16::new(i16::MIN),
        }
    }

    pub(crate) fn next(&self) -> QueueId {
        // fetch_add wraps on overflow
        QueueId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_minimum_and_increase() {
        let ids = IdAllocator::new();
        assert_eq!(ids.next().get(), i16::MIN);
        assert_eq!(ids.next().get(), i16::MIN + 1);
    }

    #[test]
    fn ids_wrap_around() {
        let ids = IdAllocator {
            next: AtomicI16::new(i16::MAX),
        };
        assert_eq!(ids.next().get(), i16::MAX);
        assert_eq!(ids.next().get(), i16::MIN);
    }
}
