// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod action_queue;
pub mod dispatcher;
pub mod queue_id;
pub mod reservation;
pub mod tick_report;
