// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::time::Duration;

use base64::prelude::BASE64_STANDARD;
use base64::Engine as _;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MAX_TICK_BUDGET_SECONDS: f64 = 5.0;

/// What the tick budget is measured against.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Default, Serialize, Deserialize)]
#[clap(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum BudgetMode {
    #[default]
    /// Default: time spent inside the current tick
    PerTick,
    /// Time since the dispatcher was created. Once exceeded, every tick runs a single action.
    SinceStart,
}

/// What happens when an action or completion callback panics during a tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Default, Serialize, Deserialize)]
#[clap(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PanicPolicy {
    #[default]
    /// Default: the panic unwinds out of tick(); the queue resumes on the next tick
    Propagate,
    /// Log the panic and keep draining; the queue still completes
    Isolate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatcherConfig {
    /// How long one tick may keep running actions before yielding.
    pub max_tick_budget_seconds: f64,
    pub budget_mode: BudgetMode,
    pub panic_policy: PanicPolicy,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_tick_budget_seconds: DEFAULT_MAX_TICK_BUDGET_SECONDS,
            budget_mode: BudgetMode::default(),
            panic_policy: PanicPolicy::default(),
        }
    }
}

impl DispatcherConfig {
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.max_tick_budget_seconds = budget.as_secs_f64();
        self
    }

    pub fn with_budget_mode(mut self, mode: BudgetMode) -> Self {
        self.budget_mode = mode;
        self
    }

    pub fn with_panic_policy(mut self, policy: PanicPolicy) -> Self {
        self.panic_policy = policy;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: DispatcherConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_base64_json(encoded: &str) -> Result<Self, ConfigError> {
        let decoded = BASE64_STANDARD.decode(encoded.trim())?;
        let json = String::from_utf8(decoded)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.max_tick_budget().map(|_| ())
    }

    pub fn max_tick_budget(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.max_tick_budget_seconds)
            .map_err(|_| ConfigError::InvalidBudget(self.max_tick_budget_seconds))
    }
}
