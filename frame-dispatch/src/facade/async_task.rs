// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

/// Work run by an [`AsyncFacade`](crate::AsyncFacade).
///
/// `run` executes on a background thread. `start` and `end` are handed to the
/// dispatcher and execute on the main context. `initialize` runs on the thread
/// that calls `initialize_and_start`. All hooks except `run` default to no-ops.
pub trait AsyncTask: Send + Sync + 'static {
    /// Free-form description, used for logging and the thread name
    fn desc(&self) -> &str;

    fn initialize(&self) {}

    /// Whether `start` has to go through the main context. If not, the
    /// background thread continues without waiting for a tick.
    fn handles_start(&self) -> bool {
        true
    }

    fn start(&self) {}

    /// Main entry point, runs on the background thread
    fn run(&self);

    fn end(&self) {}
}
