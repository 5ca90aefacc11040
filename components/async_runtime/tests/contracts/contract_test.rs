//! Contract tests for async_runtime
//!
//! These tests pin down the ordering guarantees the scenarios rely on:
//! tier precedence, settle-once, deferred observation, starvation and the
//! context-free unhandled-rejection report.

use async_runtime::{EventLoop, Promise, PromiseState, Stream};
use core_types::{ErrorKind, Value};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

mod tier_contract {
    use super::*;

    #[test]
    fn sync_then_microtask_then_timer() {
        let el = EventLoop::new();

        let log = el.clone();
        el.set_timeout(Duration::ZERO, move || {
            log.log("timer");
            Ok(())
        });
        let log = el.clone();
        Promise::resolved(&el, Value::Undefined).then(move |_| {
            log.log("microtask");
            Ok(Value::Undefined)
        });
        el.log("sync");

        el.run_until_done().unwrap();
        assert_eq!(el.stdout(), vec!["sync", "microtask", "timer"]);
    }

    #[test]
    fn long_microtask_chain_still_precedes_zero_delay_timer() {
        let el = EventLoop::new();
        let log = el.clone();
        el.set_timeout(Duration::ZERO, move || {
            log.log("timer");
            Ok(())
        });

        let mut chain = Promise::resolved(&el, Value::Smi(0));
        for _ in 0..50 {
            chain = chain.then(|v| Ok(Value::Smi(v.as_number().unwrap_or(0.0) as i32 + 1)));
        }
        let log = el.clone();
        chain.then(move |v| {
            log.log(format!("chain {}", v));
            Ok(Value::Undefined)
        });

        el.run_until_done().unwrap();
        assert_eq!(el.stdout(), vec!["chain 50", "timer"]);
    }
}

mod settlement_contract {
    use super::*;

    #[test]
    fn settle_is_one_shot() {
        let el = EventLoop::new();
        let (promise, resolvers) = Promise::with_resolvers(&el);
        assert!(resolvers.resolve(Value::Smi(1)));
        assert!(!resolvers.reject(core_types::JsError::error("x")));
        assert_eq!(promise.state(), PromiseState::Fulfilled(Value::Smi(1)));
    }

    #[test]
    fn observer_on_settled_promise_runs_after_registering_routine_returns() {
        let el = EventLoop::new();
        let promise = Promise::resolved(&el, Value::Undefined);
        let register = |el: &EventLoop| {
            let log = el.clone();
            promise.then(move |_| {
                log.log("observer");
                Ok(Value::Undefined)
            });
            el.log("register returns");
        };
        register(&el);
        el.run_until_done().unwrap();
        assert_eq!(el.stdout(), vec!["register returns", "observer"]);
    }
}

mod starvation_contract {
    use super::*;

    #[test]
    fn busy_work_delays_continuation_past_due_time() {
        let el = EventLoop::new();
        let done = Rc::new(Cell::new(false));

        let timer_el = el.clone();
        let p = Promise::new(&el, move |r| {
            timer_el.set_timeout(ms(30), move || {
                r.resolve(Value::Undefined);
                Ok(())
            });
            Ok(())
        });
        let log = el.clone();
        let flag = done.clone();
        p.then(move |_| {
            flag.set(true);
            log.log(format!("then at {}", log.now().as_millis()));
            Ok(Value::Undefined)
        });

        for _ in 0..100 {
            assert!(!done.get());
            el.burn_cpu(ms(1));
        }
        el.log("loop finished");

        el.run_until_done().unwrap();
        assert_eq!(el.stdout(), vec!["loop finished", "then at 100"]);
    }
}

mod rejection_contract {
    use super::*;

    #[test]
    fn report_has_no_origin() {
        let el = EventLoop::new();
        let inner = el.clone();
        el.call("asyncAwaitPlayground", || {
            let _p = el.spawn(async move {
                Promise::resolved(&inner, Value::Undefined).await?;
                Err(inner.new_error(ErrorKind::Error, "I am an error"))
            });
        });
        el.run_until_done().unwrap();

        let stderr: Vec<_> = el
            .trace()
            .into_iter()
            .filter(|l| l.stream == Stream::Stderr)
            .collect();
        assert_eq!(stderr.len(), 1);
        assert_eq!(
            stderr[0].text,
            "UnhandledPromiseRejectionWarning: Error: I am an error"
        );
        assert!(!stderr[0].text.contains("asyncAwaitPlayground"));
    }
}
