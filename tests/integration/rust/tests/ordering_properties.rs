//! Ordering Property Integration Tests
//!
//! Checks the ordering guarantees of the event loop through the scenario
//! library's `Lab`, with randomized but seeded inputs where the property
//! should hold for any input.

use async_runtime::{Promise, PromiseState, RuntimeError, Stream};
use core_types::{ErrorKind, JsError, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scenarios::{catalog, Lab};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Test: synchronous-only code logs in source order
#[test]
fn test_sync_trace_matches_source_order() {
    let lab = Lab::new(1);
    for i in 0..20 {
        lab.log(format!("line {}", i));
    }
    lab.run_until_done().unwrap();
    let expected: Vec<_> = (0..20).map(|i| format!("line {}", i)).collect();
    assert_eq!(lab.stdout(), expected);
}

/// Test: sync lines precede microtask lines, which precede timer lines
#[test]
fn test_tiers_never_interleave() {
    let mut rng = StdRng::seed_from_u64(2020);
    for _ in 0..25 {
        let lab = Lab::new(rng.random());
        let count = rng.random_range(1..8);
        for i in 0..count {
            match rng.random_range(0..3) {
                0 => lab.log(format!("sync {}", i)),
                1 => {
                    let inner = lab.clone();
                    Promise::resolved(&lab, Value::Undefined).then(move |_| {
                        inner.log(format!("micro {}", i));
                        Ok(Value::Undefined)
                    });
                }
                _ => {
                    let inner = lab.clone();
                    lab.set_timeout(ms(rng.random_range(0..5)), move || {
                        inner.log(format!("timer {}", i));
                        Ok(())
                    });
                }
            }
        }
        lab.run_until_done().unwrap();

        let tier = |line: &String| match line.split(' ').next() {
            Some("sync") => 0,
            Some("micro") => 1,
            _ => 2,
        };
        let tiers: Vec<_> = lab.stdout().iter().map(tier).collect();
        assert!(tiers.windows(2).all(|w| w[0] <= w[1]), "{:?}", lab.stdout());
    }
}

/// Test: observing a settled promise never runs the observer inline
#[test]
fn test_observer_never_inline() {
    let lab = Lab::new(1);
    let ran = Rc::new(Cell::new(false));
    let fulfilled = Promise::resolved(&lab, Value::Smi(1));
    let rejected = Promise::rejected(&lab, JsError::error("no"));

    let flag = ran.clone();
    fulfilled.then(move |_| {
        flag.set(true);
        Ok(Value::Undefined)
    });
    let flag = ran.clone();
    rejected.catch(move |_| {
        flag.set(true);
        Ok(Value::Undefined)
    });
    assert!(!ran.get());
    lab.run_until_done().unwrap();
    assert!(ran.get());
}

/// Test: only the first settlement takes effect
#[test]
fn test_first_settlement_wins() {
    let lab = Lab::new(1);
    let (promise, resolvers) = Promise::with_resolvers(&lab);
    let reject = resolvers.clone();
    lab.set_timeout(ms(10), move || {
        reject.reject(JsError::error("late"));
        Ok(())
    });
    lab.set_timeout(ms(5), move || {
        resolvers.resolve(Value::Smi(5));
        Ok(())
    });
    lab.run_until_done().unwrap();
    assert_eq!(promise.state(), PromiseState::Fulfilled(Value::Smi(5)));
    assert!(lab.stderr().is_empty());
}

/// Test: routines with distinct delays resume in delay order
#[test]
fn test_routines_resume_in_delay_order() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..25 {
        let lab = Lab::new(0);
        let mut delays: Vec<u64> = Vec::new();
        while delays.len() < 3 {
            let d = rng.random_range(1..100);
            if !delays.contains(&d) {
                delays.push(d);
            }
        }
        for &delay in &delays {
            let inner = lab.clone();
            lab.spawn(async move {
                inner.sleep(ms(delay), Value::Undefined).await?;
                inner.log(delay);
                Ok(Value::Undefined)
            });
        }
        lab.run_until_done().unwrap();

        let mut sorted = delays.clone();
        sorted.sort_unstable();
        let expected: Vec<_> = sorted.iter().map(u64::to_string).collect();
        assert_eq!(lab.stdout(), expected);
    }
}

/// Test: a failure after a suspend point reaches no synchronous handler
#[test]
fn test_failure_after_suspend_point_is_only_reported() {
    let lab = Lab::new(1);
    let caught = Rc::new(Cell::new(false));

    let inner = lab.clone();
    let outcome: Result<Promise, JsError> = lab.call("caller", || {
        Ok(lab.spawn(async move {
            Promise::resolved(&inner, Value::Undefined).await?;
            Err(inner.new_error(ErrorKind::Error, "after await"))
        }))
    });
    if outcome.is_err() {
        caught.set(true);
    }
    lab.run_until_done().unwrap();

    assert!(!caught.get());
    let stderr: Vec<_> = lab
        .trace()
        .into_iter()
        .filter(|l| l.stream == Stream::Stderr)
        .map(|l| l.text)
        .collect();
    assert_eq!(
        stderr,
        vec!["UnhandledPromiseRejectionWarning: Error: after await"]
    );
}

/// Test: every catalog scenario leaves a drained loop behind
#[test]
fn test_catalog_scenarios_drain() {
    for scenario in catalog() {
        let lab = Lab::new(3);
        match scenario.execute(&lab) {
            Ok(()) => {}
            Err(RuntimeError::Uncaught(e)) => {
                assert!(lab.stderr().iter().any(|l| l.starts_with("Uncaught ")));
                assert!(!e.to_string().is_empty());
            }
        }
        assert_eq!(lab.pending_timers(), 0, "{}", scenario.name);
    }
}
