// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TraceEvent {
    pub label: String,

    /// Frame the event happened in, as set by the driver
    pub tick: u32,

    pub thread: String,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn labels(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.label.as_str()).collect()
    }

    /// Labels starting with `prefix`, in execution order.
    pub fn with_prefix(&self, prefix: &str) -> Vec<&str> {
        self.labels()
            .into_iter()
            .filter(|label| label.starts_with(prefix))
            .collect()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.events.iter().position(|e| e.label == label)
    }

    pub fn tick_of(&self, label: &str) -> Option<u32> {
        self.events.iter().find(|e| e.label == label).map(|e| e.tick)
    }

    /// Pretty JSON, for assertion messages.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unserializable trace: {e}>"))
    }
}
