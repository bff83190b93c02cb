// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::dispatch::queue_id::QueueId;
use crate::error::DispatchError;

static NEXT_DISPATCHER_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Distinguishes dispatcher instances so tokens cannot be redeemed elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DispatcherInstance(u64);

impl DispatcherInstance {
    pub(crate) fn next() -> Self {
        Self(NEXT_DISPATCHER_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }
}

/// A queue id handed out before the queue's actions are known.
///
/// Obtained from [`Dispatcher::reserve`](crate::Dispatcher::reserve) and
/// redeemed exactly once with
/// [`Dispatcher::submit_reserved`](crate::Dispatcher::submit_reserved).
/// The queue is ordered by the time of that submission, not by the time of
/// reservation.
#[derive(Debug)]
pub struct ReservationToken {
    id: QueueId,
    issuer: DispatcherInstance,
    used: AtomicBool,
}

impl ReservationToken {
    pub(crate) fn new(id: QueueId, issuer: DispatcherInstance) -> Self {
        Self {
            id,
            issuer,
            used: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn is_used(&self) -> bool {
        self.used.load(Ordering::Acquire)
    }

    pub(crate) fn issuer(&self) -> DispatcherInstance {
        self.issuer
    }

    pub(crate) fn mark_used(&self) -> Result<(), DispatchError> {
        if self.used.swap(true, Ordering::AcqRel) {
            return Err(DispatchError::ReservationAlreadyUsed { id: self.id });
        }
        Ok(())
    }
}
