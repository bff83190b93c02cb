// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use frame_dispatch::{action, DispatchError, Dispatcher, DispatcherConfig, OneShotSignal, QueueId};
use frame_dispatch_tests::frame_driver::FrameDriver;
use frame_dispatch_tests::recorder::Recorder;

#[cfg(feature = "slow-stress")]
const QUEUES_PER_PRODUCER: usize = 2_000;
#[cfg(not(feature = "slow-stress"))]
const QUEUES_PER_PRODUCER: usize = 100;

const PRODUCERS: usize = 6;

//
// Producers submit while the main context ticks.
//
#[test]
fn concurrent_producers_keep_per_producer_order() {
    let dispatcher = Arc::new(
        Dispatcher::new(DispatcherConfig::default().with_budget(Duration::from_micros(200))).unwrap(),
    );
    let recorder = Recorder::new();
    let barrier = Arc::new(Barrier::new(PRODUCERS));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let dispatcher = dispatcher.clone();
            let recorder = recorder.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for q in 0..QUEUES_PER_PRODUCER {
                    dispatcher.submit(
                        recorder.actions(&format!("p{p}-q{q}-a"), 3),
                        recorder.completion(format!("p{p}-q{q}-done")),
                    );
                }
            })
        })
        .collect();

    let mut driver = FrameDriver::new(&dispatcher);
    let all_done = driver.pump_until(Duration::ZERO, Duration::from_secs(30), || {
        producers.iter().all(|p| p.is_finished()) && dispatcher.is_idle()
    });
    assert!(all_done, "dispatcher did not drain in time");
    for p in producers {
        p.join().unwrap();
    }

    let trace = recorder.trace();
    for p in 0..PRODUCERS {
        let prefix = format!("p{p}-");
        let expected: Vec<String> = (0..QUEUES_PER_PRODUCER)
            .flat_map(|q| {
                (1..=3)
                    .map(move |a| format!("p{p}-q{q}-a{a}"))
                    .chain(std::iter::once(format!("p{p}-q{q}-done")))
            })
            .collect();
        assert_eq!(trace.with_prefix(&prefix), expected);
    }

    // a queue's events are contiguous: no other queue runs in between
    let labels = trace.labels();
    for window in labels.windows(2) {
        if window[0].ends_with("-a1") || window[0].ends_with("-a2") {
            let queue = format!("{}-", window[0].rsplit_once("-a").unwrap().0);
            assert!(window[1].starts_with(&queue), "{} then {}", window[0], window[1]);
        }
    }
}

#[test]
fn all_work_runs_on_the_ticking_thread() {
    let dispatcher = Arc::new(Dispatcher::default());
    let ticking_thread = Arc::new(Mutex::new(None));
    let wrong_thread = Arc::new(AtomicBool::new(false));
    let ran = Arc::new(AtomicUsize::new(0));

    let producer = {
        let dispatcher = dispatcher.clone();
        let ticking_thread = ticking_thread.clone();
        let wrong_thread = wrong_thread.clone();
        let ran = ran.clone();
        thread::spawn(move || {
            for _ in 0..50 {
                let ticking_thread = ticking_thread.clone();
                let wrong_thread = wrong_thread.clone();
                let ran = ran.clone();
                dispatcher.post(move || {
                    if *ticking_thread.lock().unwrap() != Some(thread::current().id()) {
                        wrong_thread.store(true, Ordering::SeqCst);
                    }
                    ran.fetch_add(1, Ordering::SeqCst);
                });
            }
        })
    };

    *ticking_thread.lock().unwrap() = Some(thread::current().id());
    let mut driver = FrameDriver::new(&dispatcher);
    assert!(driver.pump_until(Duration::from_millis(1), Duration::from_secs(10), || {
        ran.load(Ordering::SeqCst) == 50
    }));
    producer.join().unwrap();

    assert!(!wrong_thread.load(Ordering::SeqCst));
}

//
// Cancellation from another thread while the main context drains.
//
#[test]
fn cancel_from_worker_suppresses_completion() {
    let dispatcher = Arc::new(Dispatcher::default());
    let recorder = Recorder::new();
    let first_ran = Arc::new(OneShotSignal::new());
    let cancelled = Arc::new(OneShotSignal::new());
    let id_slot: Arc<Mutex<Option<QueueId>>> = Arc::new(Mutex::new(None));

    // the first action blocks the main context until the worker has cancelled
    let (signal_ran, wait_cancel) = (first_ran.clone(), cancelled.clone());
    let blocking = action(move || {
        signal_ran.set();
        assert!(wait_cancel.wait_timeout(Duration::from_secs(10)));
    });
    let mut actions = vec![blocking];
    actions.extend(recorder.actions("after-cancel", 3));
    let id = dispatcher.submit(actions, recorder.completion("done"));
    *id_slot.lock().unwrap() = Some(id);

    let canceller = {
        let dispatcher = dispatcher.clone();
        let id_slot = id_slot.clone();
        thread::spawn(move || {
            assert!(first_ran.wait_timeout(Duration::from_secs(10)));
            let id = id_slot.lock().unwrap().expect("queue id published");
            let removed = dispatcher.cancel(id);
            cancelled.set();
            removed
        })
    };

    let report = dispatcher.tick();
    assert_eq!(canceller.join().unwrap(), 1);

    assert_eq!(report.actions_executed, 1);
    assert!(recorder.trace().labels().is_empty());
    assert!(dispatcher.is_idle());
}

#[test]
fn reservations_from_many_threads_are_unique() {
    let dispatcher = Arc::new(Dispatcher::default());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let dispatcher = dispatcher.clone();
            thread::spawn(move || (0..100).map(|_| dispatcher.reserve().id()).collect::<Vec<_>>())
        })
        .collect();

    let mut ids: Vec<QueueId> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 800);
}

#[test]
fn racing_redemptions_of_one_reservation_enqueue_once() {
    for _ in 0..50 {
        let dispatcher = Arc::new(Dispatcher::default());
        let recorder = Recorder::new();
        let token = Arc::new(dispatcher.reserve());
        let barrier = Arc::new(Barrier::new(2));

        let racers: Vec<_> = ["left", "right"]
            .into_iter()
            .map(|side| {
                let dispatcher = dispatcher.clone();
                let recorder = recorder.clone();
                let token = token.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    dispatcher.submit_reserved(recorder.actions(side, 1), || {}, &token)
                })
            })
            .collect();
        let results: Vec<_> = racers.into_iter().map(|r| r.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(DispatchError::ReservationAlreadyUsed { .. }))));
        assert!(token.is_used());
        assert_eq!(dispatcher.pending_queues(), 1);

        FrameDriver::new(&dispatcher).drain(5);
        assert_eq!(recorder.trace().labels().len(), 1);
    }
}

#[test]
fn awaitable_completion_from_worker() {
    let dispatcher = Arc::new(Dispatcher::default());
    let recorder = Recorder::new();

    let worker = {
        let dispatcher = dispatcher.clone();
        let recorder = recorder.clone();
        thread::spawn(move || {
            let (_, done) = dispatcher.submit_awaitable(recorder.actions("w", 2));
            futures::executor::block_on(done)
        })
    };

    let mut driver = FrameDriver::new(&dispatcher);
    assert!(driver.pump_until(Duration::from_millis(1), Duration::from_secs(10), || {
        worker.is_finished()
    }));
    assert_eq!(worker.join().unwrap(), Ok(()));
    assert_eq!(recorder.trace().labels(), ["w1", "w2"]);
}
