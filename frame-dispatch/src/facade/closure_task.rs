// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::fmt;

use crate::facade::async_task::AsyncTask;

type Hook = Box<dyn Fn() + Send + Sync + 'static>;

/// An [`AsyncTask`] assembled from closures.
pub struct ClosureTask {
    desc: String,
    body: Hook,
    initialize: Option<Hook>,
    start: Option<Hook>,
    end: Option<Hook>,
}

impl ClosureTask {
    pub fn new<F>(desc: impl Into<String>, body: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            desc: desc.into(),
            body: Box::new(body),
            initialize: None,
            start: None,
            end: None,
        }
    }

    pub fn on_initialize<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.initialize = Some(Box::new(f));
        self
    }

    pub fn on_start<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.start = Some(Box::new(f));
        self
    }

    pub fn on_end<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.end = Some(Box::new(f));
        self
    }
}

impl AsyncTask for ClosureTask {
    fn desc(&self) -> &str {
        &self.desc
    }

    fn initialize(&self) {
        if let Some(f) = &self.initialize {
            f();
        }
    }

    fn handles_start(&self) -> bool {
        self.start.is_some()
    }

    fn start(&self) {
        if let Some(f) = &self.start {
            f();
        }
    }

    fn run(&self) {
        (self.body)();
    }

    fn end(&self) {
        if let Some(f) = &self.end {
            f();
        }
    }
}

impl fmt::Debug for ClosureTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureTask")
            .field("desc", &self.desc)
            .field("initialize", &self.initialize.is_some())
            .field("start", &self.start.is_some())
            .field("end", &self.end.is_some())
            .finish()
    }
}
