// SPDX-License-Identifier: MIT
// frame-loop: drives a frame-dispatch Dispatcher from a simulated frame loop
//
// - Worker threads submit action queues (some through reservations).
// - The main thread ticks the dispatcher once per frame.
// - A background facade task reports its start/end on the main thread.
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use frame_dispatch::{
    AsyncFacade, BudgetMode, ClosureTask, Dispatcher, DispatcherConfig, FacadeState, PanicPolicy,
};
use log::info;

pub mod run_report;
pub mod workload;

use crate::run_report::RunReport;
use crate::workload::{Workload, WorkloadCounters};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Number of frames to simulate before draining the rest
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Worker threads submitting queues
    #[arg(long, default_value_t = 4)]
    workers: usize,

    #[arg(long, default_value_t = 8)]
    queues_per_worker: usize,

    #[arg(long, default_value_t = 16)]
    actions_per_queue: usize,

    /// Simulated cost of one action in microseconds
    #[arg(long, default_value_t = 200)]
    action_cost_us: u64,

    /// Target frame length in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Per-tick budget in milliseconds
    #[arg(long)]
    budget_ms: Option<f64>,

    #[arg(long, value_enum)]
    budget_mode: Option<BudgetMode>,

    #[arg(long, value_enum)]
    panic_policy: Option<PanicPolicy>,

    /// Cancel every n-th queue right after submitting it
    #[arg(long, value_name = "N")]
    cancel_every: Option<usize>,

    /// Dispatcher config (JSON encoded). Note that this excludes the other dispatcher options.
    #[arg(long, value_name = "JSON")]
    config: Option<String>,

    /// Dispatcher config (base64-encoded JSON). Note that this excludes the other dispatcher options.
    #[arg(long = "config-base64", value_name = "BASE64")]
    config_base64: Option<String>,

    /// Print a JSON run report to stdout when done
    #[arg(long)]
    report: bool,
}

const DEFAULT_BUDGET_MS: f64 = 8.0;
const DRAIN_FRAME_LIMIT: u32 = 10_000;

fn validate_args(args: &Args) -> Result<(), String> {
    let config: &Option<String> = match (&args.config, &args.config_base64) {
        (None, None) => &None,
        (None, Some(_)) => &args.config_base64,
        (Some(_), None) => &args.config,
        (Some(_), Some(_)) => {
            return Err("--config and --config-base64 may not be used together".into());
        }
    };

    match (
        config,
        &args.budget_ms,
        &args.budget_mode,
        &args.panic_policy,
    ) {
        (Some(_), None, None, None) | (None, _, _, _) => {}
        _ => {
            return Err("--config or --config-base64 must not be used in combination with --budget-ms, --budget-mode or --panic-policy".into());
        }
    }

    if args.cancel_every == Some(0) {
        return Err("--cancel-every must be at least 1".into());
    }

    if args.workers == 0 && args.frames == 0 {
        return Err("nothing to do: --workers and --frames are both 0".into());
    }

    Ok(())
}

fn dispatcher_config(args: &Args) -> anyhow::Result<DispatcherConfig> {
    let config = match (&args.config, &args.config_base64) {
        (Some(json), None) => DispatcherConfig::from_json(json)?,
        (None, Some(b64)) => DispatcherConfig::from_base64_json(b64)?,
        (None, None) => DispatcherConfig {
            max_tick_budget_seconds: args.budget_ms.unwrap_or(DEFAULT_BUDGET_MS) / 1000.0,
            budget_mode: args.budget_mode.unwrap_or_default(),
            panic_policy: args.panic_policy.unwrap_or_default(),
        },
        _ => unreachable!("validate_args enforces mutual exclusion"),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {e}");
        std::process::exit(2);
    }

    let config = dispatcher_config(&args).context("failed to build the dispatcher config")?;
    info!("Starting frame loop with {:?}", config);
    let dispatcher = Arc::new(Dispatcher::new(config)?);

    let counters = WorkloadCounters::new();
    let workload = Workload {
        workers: args.workers,
        queues_per_worker: args.queues_per_worker,
        actions_per_queue: args.actions_per_queue,
        action_cost: Duration::from_micros(args.action_cost_us),
        cancel_every: args.cancel_every,
    };
    let worker_handles = workload.spawn(&dispatcher, &counters)?;

    let mut facade = AsyncFacade::new(
        dispatcher.clone(),
        ClosureTask::new("warm-up", || thread::sleep(Duration::from_millis(30)))
            .on_start(|| info!("warm-up started on the main thread"))
            .on_end(|| info!("warm-up finished on the main thread")),
    );
    facade
        .initialize_and_start()
        .context("failed to spawn the warm-up thread")?;

    let frame = Duration::from_millis(args.frame_ms);
    let mut report = RunReport::default();
    let mut frame_no: u32 = 0;

    loop {
        let frame_start = Instant::now();
        let tick = dispatcher.tick();
        report.record_tick(&tick);
        frame_no += 1;

        let workers_done = worker_handles.iter().all(|handle| handle.is_finished());
        let warm_up_done = facade.state() == FacadeState::Finished;
        if frame_no >= args.frames && workers_done && warm_up_done && dispatcher.is_idle() {
            break;
        }
        if frame_no >= args.frames + DRAIN_FRAME_LIMIT {
            anyhow::bail!("dispatcher did not drain within {DRAIN_FRAME_LIMIT} extra frames");
        }

        if let Some(rest) = frame.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }

    for handle in worker_handles {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("a worker thread panicked"))?;
    }
    facade
        .join()
        .map_err(|_| anyhow::anyhow!("the warm-up thread panicked"))?;

    report.finish(&counters);
    info!(
        "Stopping frame loop after {} frames: {} actions, {} queues completed, {} cancelled",
        report.frames, report.actions_executed, report.queues_completed, report.queues_cancelled
    );

    if args.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
