// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use thiserror::Error;

use crate::dispatch::queue_id::QueueId;

/// Errors reported synchronously by the submission API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The reservation token has already been consumed by an earlier submission.
    #[error("reservation {id} has already been used")]
    ReservationAlreadyUsed { id: QueueId },

    /// The reservation token was issued by a different dispatcher instance.
    #[error("reservation {id} was issued by another dispatcher")]
    ForeignReservation { id: QueueId },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_tick_budget_seconds must be a finite, non-negative number of seconds (got {0})")]
    InvalidBudget(f64),

    #[error("invalid dispatcher config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dispatcher config is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decoded dispatcher config is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
