#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Lane behaviour: failure conversion, concurrency bounds, controller memoization.

use laneway::binder::{ArgValue, Args};
use laneway::dispatcher::{handler_fn, Controller, Failure, Outcome};
use laneway::route::WorkloadClass;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::test_server::test_dispatcher;

#[test]
fn test_cpu_lane_handler_error_is_500_with_message() {
    let dispatcher = test_dispatcher(2);
    let handler = handler_fn(|_| Err(anyhow::anyhow!("disk full")));
    let outcome = dispatcher.dispatch(&handler, Args::new(), WorkloadClass::Cpu).wait();
    match outcome {
        Outcome::Failure(f) => {
            assert_eq!(f.status, 500);
            assert!(f.message.contains("disk full"));
        }
        Outcome::Value(v) => panic!("expected failure, got {v}"),
    }
}

#[test]
fn test_typed_failure_keeps_status() {
    let dispatcher = test_dispatcher(1);
    let handler = handler_fn(|_| Err(Failure::new(409, "already exists").into()));
    for class in [WorkloadClass::Io, WorkloadClass::Cpu] {
        let outcome = dispatcher.dispatch(&handler, Args::new(), class).wait();
        assert_eq!(outcome.status(), 409);
    }
}

#[test]
fn test_panicking_handler_is_500_on_both_lanes() {
    let dispatcher = test_dispatcher(1);
    let handler = handler_fn(|_| -> anyhow::Result<Value> { panic!("kaboom") });
    for class in [WorkloadClass::Io, WorkloadClass::Cpu] {
        match dispatcher.dispatch(&handler, Args::new(), class).wait() {
            Outcome::Failure(f) => {
                assert_eq!(f.status, 500);
                assert!(f.message.contains("kaboom"));
            }
            Outcome::Value(v) => panic!("expected failure, got {v}"),
        }
    }
    // The single CPU worker survived the panic.
    let ok = handler_fn(|_| Ok(json!("still alive")));
    let outcome = dispatcher.dispatch(&ok, Args::new(), WorkloadClass::Cpu).wait();
    assert_eq!(outcome.status(), 200);
}

#[test]
fn test_cpu_lane_concurrency_bounded_by_workers() {
    const WORKERS: usize = 2;
    let dispatcher = test_dispatcher(WORKERS);
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let handler = {
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);
        handler_fn(move |_| {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            running.fetch_sub(1, Ordering::SeqCst);
            Ok(json!(null))
        })
    };

    let futures: Vec<_> = (0..8)
        .map(|_| dispatcher.dispatch(&handler, Args::new(), WorkloadClass::Cpu))
        .collect();
    for future in futures {
        assert_eq!(future.wait().status(), 200);
    }

    assert!(peak.load(Ordering::SeqCst) <= WORKERS);
    let metrics = dispatcher.metrics(WorkloadClass::Cpu);
    assert!(metrics.peak_in_flight <= WORKERS);
    assert_eq!(metrics.completed, 8);
    assert_eq!(metrics.failed, 0);
}

#[test]
fn test_cpu_lane_uses_every_worker() {
    const WORKERS: usize = 3;
    let dispatcher = test_dispatcher(WORKERS);
    let handler = handler_fn(|_| {
        std::thread::sleep(Duration::from_millis(60));
        Ok(json!(null))
    });

    let futures: Vec<_> = (0..2 * WORKERS)
        .map(|_| dispatcher.dispatch(&handler, Args::new(), WorkloadClass::Cpu))
        .collect();
    for future in futures {
        assert_eq!(future.wait().status(), 200);
    }

    let metrics = dispatcher.metrics(WorkloadClass::Cpu);
    assert_eq!(metrics.peak_in_flight, WORKERS);
    assert_eq!(metrics.completed, 2 * WORKERS as u64);
}

#[test]
fn test_cpu_lane_backlog_is_queued() {
    let dispatcher = test_dispatcher(1);
    let handler = handler_fn(|_| {
        std::thread::sleep(Duration::from_millis(80));
        Ok(json!(null))
    });

    let futures: Vec<_> = (0..4)
        .map(|_| dispatcher.dispatch(&handler, Args::new(), WorkloadClass::Cpu))
        .collect();
    for _ in 0..100 {
        if dispatcher.metrics(WorkloadClass::Cpu).in_flight == 1 {
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    let metrics = dispatcher.metrics(WorkloadClass::Cpu);
    assert_eq!(metrics.in_flight, 1);
    assert_eq!(metrics.queued(), 3);

    for future in futures {
        assert_eq!(future.wait().status(), 200);
    }
    assert_eq!(dispatcher.metrics(WorkloadClass::Cpu).queued(), 0);
}

#[test]
fn test_io_lane_runs_tasks_concurrently() {
    let dispatcher = test_dispatcher(1);
    let handler = handler_fn(|_| {
        may::coroutine::sleep(Duration::from_millis(50));
        Ok(json!(null))
    });

    let futures: Vec<_> = (0..8)
        .map(|_| dispatcher.dispatch(&handler, Args::new(), WorkloadClass::Io))
        .collect();
    for future in futures {
        assert_eq!(future.wait().status(), 200);
    }
    assert!(dispatcher.metrics(WorkloadClass::Io).peak_in_flight > 1);
}

#[test]
fn test_controller_constructed_once_across_lanes() {
    struct Counter;
    static BUILT: AtomicUsize = AtomicUsize::new(0);

    let controller = Controller::new(|| {
        BUILT.fetch_add(1, Ordering::SeqCst);
        Counter
    });
    fn echo(_: &Counter, args: &Args) -> anyhow::Result<Value> {
        Ok(json!(args.int(0)))
    }
    let handler = controller.route(echo);
    assert!(!controller.is_initialized());

    let dispatcher = test_dispatcher(2);
    let futures: Vec<_> = (0..16)
        .map(|i| {
            let class = if i % 2 == 0 { WorkloadClass::Io } else { WorkloadClass::Cpu };
            let args = Args::from_values([Some(ArgValue::Int(i))]);
            dispatcher.dispatch(&handler, args, class)
        })
        .collect();
    for (i, future) in futures.into_iter().enumerate() {
        match future.wait() {
            Outcome::Value(v) => assert_eq!(v, json!(i)),
            Outcome::Failure(f) => panic!("unexpected failure: {}", f.message),
        }
    }
    assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    assert!(controller.is_initialized());
}

#[test]
fn test_wait_timeout_discards_late_outcome() {
    let dispatcher = test_dispatcher(1);
    let handler = handler_fn(|_| {
        std::thread::sleep(Duration::from_millis(100));
        Ok(json!("late"))
    });
    let future = dispatcher.dispatch(&handler, Args::new(), WorkloadClass::Cpu);
    assert!(future.wait_timeout(Duration::from_millis(10)).is_none());

    // The worker finishes the abandoned task and keeps serving.
    let quick = handler_fn(|_| Ok(json!("quick")));
    let outcome = dispatcher.dispatch(&quick, Args::new(), WorkloadClass::Cpu).wait();
    assert!(matches!(outcome, Outcome::Value(v) if v == json!("quick")));
}

#[test]
fn test_try_take_yields_once() {
    let dispatcher = test_dispatcher(1);
    let handler = handler_fn(|_| Ok(json!(1)));
    let mut future = dispatcher.dispatch(&handler, Args::new(), WorkloadClass::Io);

    let mut taken = None;
    for _ in 0..200 {
        if let Some(outcome) = future.try_take() {
            taken = Some(outcome);
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(matches!(taken, Some(Outcome::Value(_))));
    assert!(future.is_taken());
    assert!(future.try_take().is_none());
}
