// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::thread;
use std::time::{Duration, Instant};

use frame_dispatch::{Dispatcher, TickReport};

use crate::recorder::Recorder;

/// Plays the main context: ticks a dispatcher frame by frame and numbers the frames.
pub struct FrameDriver<'a> {
    dispatcher: &'a Dispatcher,
    recorder: Option<Recorder>,
    frame: u32,
}

impl<'a> FrameDriver<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self {
            dispatcher,
            recorder: None,
            frame: 0,
        }
    }

    /// Events recorded by `recorder` are stamped with the current frame number.
    pub fn with_recorder(mut self, recorder: &Recorder) -> Self {
        self.recorder = Some(recorder.clone());
        self
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn tick(&mut self) -> TickReport {
        self.frame += 1;
        if let Some(recorder) = &self.recorder {
            recorder.set_tick(self.frame);
        }
        self.dispatcher.tick()
    }

    /// Ticks until the dispatcher is idle. Panics after `max_frames`.
    pub fn drain(&mut self, max_frames: u32) -> Vec<TickReport> {
        let mut reports = Vec::new();
        while !self.dispatcher.is_idle() {
            assert!(
                reports.len() < max_frames as usize,
                "dispatcher still busy after {max_frames} frames"
            );
            reports.push(self.tick());
        }
        reports
    }

    /// Ticks (sleeping `frame_len` between frames) until `done` holds.
    /// Returns false on timeout.
    pub fn pump_until(
        &mut self,
        frame_len: Duration,
        timeout: Duration,
        mut done: impl FnMut() -> bool,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        while !done() {
            if Instant::now() >= deadline {
                return false;
            }
            self.tick();
            thread::sleep(frame_len);
        }
        true
    }
}
