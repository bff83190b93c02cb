// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>
//! # Design: Time-Sliced Main-Context Dispatcher
//!
//! ## Overview
//! Worker threads hand ordered lists of closures to a [`Dispatcher`]. A single
//! main context (e.g. a frame loop) calls [`Dispatcher::tick`] once per frame
//! and runs the queued closures there.
//!
//! - Queues run strictly in submission order, one at a time.
//! - Actions inside a queue run in order and are removed as they run.
//! - A queue's completion callback fires once, after its last action.
//! - `tick` yields once its time budget is spent and resumes mid-queue on the
//!   next call.
//! - Queue ids can be reserved up front with [`ReservationToken`]s.
//! - [`AsyncFacade`] runs a body on a background thread and marshals its
//!   start/end hooks onto the main context.
//!
//! ```text
//!         +-----------+  +-----------+  +-------------+
//!         | worker A  |  | worker B  |  | AsyncFacade |
//!         +-----+-----+  +-----+-----+  +------+------+
//!               | submit       | submit_reserved | start / end
//!               v              v                 v
//!         +-----+--------------+-----------------+------+
//!         |  Dispatcher: [Q1][Q2][Q3] ... (FIFO)        |
//!         +----------------------+----------------------+
//!                                | tick() once per frame
//!                         +------v------+
//!                         | main context|
//!                         +-------------+
//! ```

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod facade;
pub mod signal;

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{BudgetMode, DispatcherConfig, PanicPolicy};
pub use crate::dispatch::action_queue::{action, Action};
pub use crate::dispatch::dispatcher::{Dispatcher, QueueCompletion};
pub use crate::dispatch::queue_id::QueueId;
pub use crate::dispatch::reservation::ReservationToken;
pub use crate::dispatch::tick_report::TickReport;
pub use crate::error::{ConfigError, DispatchError};
pub use crate::facade::async_facade::{AsyncFacade, FacadeState};
pub use crate::facade::async_task::AsyncTask;
pub use crate::facade::closure_task::ClosureTask;
pub use crate::signal::OneShotSignal;
