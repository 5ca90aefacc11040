//! Unit tests for async routines driven by the event loop

use async_runtime::{EventLoop, Promise, PromiseState};
use core_types::{ErrorKind, JsError, Value};
use std::time::Duration;

fn delayed(el: &EventLoop, delay: u64, value: Value) -> Promise {
    let el2 = el.clone();
    Promise::new(el, move |r| {
        el2.set_timeout(Duration::from_millis(delay), move || {
            r.resolve(value);
            Ok(())
        });
        Ok(())
    })
}

#[test]
fn code_before_first_await_runs_synchronously() {
    let el = EventLoop::new();
    let log = el.clone();
    let _p = el.spawn(async move {
        log.log("inside");
        Ok(Value::Undefined)
    });
    el.log("after spawn");
    assert_eq!(el.stdout(), vec!["inside", "after spawn"]);
}

#[test]
fn routine_without_await_settles_immediately() {
    let el = EventLoop::new();
    let p = el.spawn(async { Ok(Value::Smi(35)) });
    assert_eq!(p.state(), PromiseState::Fulfilled(Value::Smi(35)));
}

#[test]
fn await_on_settled_promise_still_suspends() {
    let el = EventLoop::new();
    let log = el.clone();
    let settled = Promise::resolved(&el, Value::Smi(1));
    let _p = el.spawn(async move {
        let v = settled.await?;
        log.log(format!("resumed with {}", v));
        Ok(Value::Undefined)
    });
    el.log("caller");
    el.run_all_microtasks().unwrap();
    assert_eq!(el.stdout(), vec!["caller", "resumed with 1"]);
}

#[test]
fn await_resumes_after_timer() {
    let el = EventLoop::new();
    let log = el.clone();
    let waiting = delayed(&el, 20, Value::string("done"));
    let p = el.spawn(async move {
        let v = waiting.await?;
        log.log(format!("{} at {}", v, log.now().as_millis()));
        Ok(v)
    });
    assert!(p.is_pending());
    el.run_until_done().unwrap();
    assert_eq!(el.stdout(), vec!["done at 20"]);
    assert_eq!(p.state(), PromiseState::Fulfilled(Value::string("done")));
}

#[test]
fn await_surfaces_rejection_as_err() {
    let el = EventLoop::new();
    let log = el.clone();
    let inner_el = el.clone();
    let _p = el.spawn(async move {
        let failing = inner_el.spawn(async { Err(JsError::error("I am an error")) });
        match failing.await {
            Ok(_) => log.log("unreachable"),
            Err(e) => log.log(format!("Caught and handled error: {}", e.message)),
        }
        Ok(Value::Undefined)
    });
    el.run_until_done().unwrap();
    assert_eq!(el.stdout(), vec!["Caught and handled error: I am an error"]);
    assert!(el.stderr().is_empty());
}

#[test]
fn error_after_await_rejects_routine_promise_only() {
    let el = EventLoop::new();
    let inner = el.clone();
    let caught_sync = {
        let p = el.spawn(async move {
            Promise::resolved(&inner, Value::Undefined).await?;
            Err(inner.new_error(ErrorKind::Error, "after suspend"))
        });
        p.is_pending()
    };
    assert!(caught_sync);
    el.run_until_done().unwrap();
    assert_eq!(
        el.stderr(),
        vec!["UnhandledPromiseRejectionWarning: Error: after suspend"]
    );
}

#[test]
fn question_mark_propagates_rejection_to_routine_promise() {
    let el = EventLoop::new();
    let inner = el.clone();
    let outer = el.spawn(async move {
        Promise::rejected(&inner, JsError::error("inner")).await?;
        Ok(Value::string("unreachable"))
    });
    let log = el.clone();
    outer.catch(move |e| {
        log.log(format!("outer rejected: {}", e.message));
        Ok(Value::Undefined)
    });
    el.run_until_done().unwrap();
    assert_eq!(el.stdout(), vec!["outer rejected: inner"]);
    assert!(el.stderr().is_empty());
}

#[test]
fn routines_interleave_in_delay_order() {
    let el = EventLoop::new();
    for (name, delay) in [("slow", 30), ("fast", 10), ("medium", 20)] {
        let log = el.clone();
        let wait = delayed(&el, delay, Value::Undefined);
        let _p = el.spawn(async move {
            wait.await?;
            log.log(name);
            Ok(Value::Undefined)
        });
    }
    el.run_until_done().unwrap();
    assert_eq!(el.stdout(), vec!["fast", "medium", "slow"]);
}

#[test]
fn awaiting_same_promise_twice_yields_same_value() {
    let el = EventLoop::new();
    let log = el.clone();
    let shared = delayed(&el, 5, Value::Smi(9));
    let _p = el.spawn(async move {
        let a = (&shared).await?;
        let b = (&shared).await?;
        log.log(format!("{} {}", a, b));
        Ok(Value::Undefined)
    });
    el.run_until_done().unwrap();
    assert_eq!(el.stdout(), vec!["9 9"]);
}
