//! Async routines and their suspend points.
//!
//! An async function is a routine started with [`EventLoop::spawn`]: its body
//! runs synchronously up to the first `.await`, and its result is always a
//! promise. The playground bodies here are themselves async, so each scenario
//! spawns one routine and lets the loop finish it.
//!
//! [`EventLoop::spawn`]: async_runtime::EventLoop::spawn

use crate::{ms, Lab};
use async_runtime::Promise;
use core_types::{ErrorKind, JsError, Value};
use std::future::Future;
use std::time::Duration;

/// `async () => Math.random() * 35`
fn return_rand_num_async(lab: &Lab) -> Promise {
    let inner = lab.clone();
    lab.spawn(async move { Ok(Value::Double(inner.random() * 35.0)) })
}

/// `() => Math.random() * 35`
fn return_35(lab: &Lab) -> f64 {
    lab.random() * 35.0
}

/// `async () => { throw new Error('I am an error') }`
fn error_throwing_async_function(lab: &Lab) -> Promise {
    let inner = lab.clone();
    lab.call("errorThrowingAsyncFunction", || {
        lab.spawn(async move { Err(inner.new_error(ErrorKind::Error, "I am an error")) })
    })
}

/// Starts the scenario body as an async routine. Its own promise is dropped,
/// so a failure escaping it would surface as an unhandled rejection.
fn playground<F, Fut>(lab: &Lab, body: F) -> Result<(), JsError>
where
    F: FnOnce(Lab) -> Fut,
    Fut: Future<Output = Result<(), JsError>> + 'static,
{
    let routine = body(lab.clone());
    lab.spawn(async move {
        routine.await?;
        Ok(Value::Undefined)
    });
    Ok(())
}

pub(crate) fn async_returns_promise(lab: &Lab) -> Result<(), JsError> {
    lab.log(return_rand_num_async(lab));
    lab.log(Value::Double(return_35(lab)));
    Ok(())
}

pub(crate) fn async_sum(lab: &Lab) -> Result<(), JsError> {
    let sum = return_35(lab) + return_35(lab);
    lab.log(Value::Double(sum));
    // `+` on two objects concatenates their string forms.
    let async_sum = format!(
        "{}{}",
        return_rand_num_async(lab).to_js_string(),
        return_rand_num_async(lab).to_js_string()
    );
    lab.log(async_sum);
    Ok(())
}

pub(crate) fn async_then_order(lab: &Lab) -> Result<(), JsError> {
    let inner = lab.clone();
    let res = return_rand_num_async(lab).then(move |res| {
        inner.log(format!("This will happen next: {}", res));
        Ok(Value::Undefined)
    });
    lab.log(format!("This will happen first {}", res.to_js_string()));
    Ok(())
}

pub(crate) fn await_value(lab: &Lab) -> Result<(), JsError> {
    playground(lab, |lab| async move {
        let res = return_rand_num_async(&lab).await?;
        lab.log(format!("This will happen first {}", res));
        Ok(())
    })
}

pub(crate) fn await_try_catch(lab: &Lab) -> Result<(), JsError> {
    playground(lab, |lab| async move {
        let attempt = async {
            lab.log("I'm about to throw an error!");
            error_throwing_async_function(&lab).await?;
            Ok::<_, JsError>(())
        }
        .await;
        if let Err(e) = attempt {
            lab.log(format!("Caught and handled error: {}", e.message));
        }
        Ok(())
    })
}

pub(crate) fn await_mixed_catch(lab: &Lab) -> Result<(), JsError> {
    playground(lab, |lab| async move {
        let attempt = async {
            lab.log("1");
            let inner = lab.clone();
            error_throwing_async_function(&lab).catch(move |_| {
                inner.log("3");
                Ok(Value::Undefined)
            });
            lab.log("2");
            error_throwing_async_function(&lab).await?;
            Ok::<_, JsError>(())
        }
        .await;
        if attempt.is_err() {
            lab.log("4");
        }
        lab.log("5");
        Ok(())
    })
}

pub(crate) fn unawaited_rejection(lab: &Lab) -> Result<(), JsError> {
    playground(lab, |lab| async move {
        let attempt: Result<(), JsError> = {
            lab.log("we will get here");
            error_throwing_async_function(&lab);
            lab.log("we will even get here");
            Ok(())
        };
        if attempt.is_err() {
            lab.log("We will never get here");
        }
        Ok(())
    })
}

pub(crate) fn await_keeps_promise(lab: &Lab) -> Result<(), JsError> {
    playground(lab, |lab| async move {
        let p = return_rand_num_async(&lab);
        lab.log(format!("P is just a Promise right now: {}", p.to_js_string()));
        (&p).await?;
        lab.log(format!(
            "P but after awaiting it has a value: {}",
            p.to_js_string()
        ));
        Ok(())
    })
}

pub(crate) fn await_assigns_value(lab: &Lab) -> Result<(), JsError> {
    playground(lab, |lab| async move {
        let p = return_rand_num_async(&lab);
        lab.log(format!("P is just a Promise right now: {}", p.to_js_string()));
        let val = (&p).await?;
        lab.log(format!(
            "P after awaiting and adding 1 to its value: {}1\nBut after assigning its value: {}",
            p.to_js_string(),
            val
        ));
        Ok(())
    })
}

pub(crate) fn staggered_routines(lab: &Lab) -> Result<(), JsError> {
    for (name, delay) in [("first", 30), ("second", 10), ("third", 20)] {
        let inner = lab.clone();
        lab.spawn(async move {
            inner.log(format!("{} started", name));
            inner.sleep(ms(delay), Value::Undefined).await?;
            inner.log(format!("{} resumed after {}ms", name, delay));
            Ok(Value::Undefined)
        });
    }
    Ok(())
}

pub(crate) fn await_zero_delay(lab: &Lab) -> Result<(), JsError> {
    let timer = lab.clone();
    lab.set_timeout(Duration::ZERO, move || {
        timer.log("zero-delay timer fired");
        Ok(())
    });
    let inner = lab.clone();
    lab.spawn(async move {
        inner.log("routine started");
        Promise::resolved(&inner, Value::Undefined).await?;
        inner.log("routine resumed");
        Ok(Value::Undefined)
    });
    lab.log("synchronous code done");
    Ok(())
}
