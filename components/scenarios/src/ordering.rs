//! Synchronous ordering, call stacks, and where errors do and do not reach.

use crate::{ms, Lab};
use async_runtime::Promise;
use core_types::{ErrorKind, JsError, Value};
use std::cell::Cell;
use std::rc::Rc;

/// Iterations the busy loop runs for when nothing stops it.
const BUSY_LOOP_LIMIT: u32 = 5_000_000;

/// Iterations charged as one millisecond of CPU time.
const ITERATIONS_PER_MS: u32 = 100_000;

pub(crate) fn sync_order(lab: &Lab) -> Result<(), JsError> {
    lab.log("statement 1");
    lab.log("statement 2");
    lab.log("statement 3... all in order");
    Ok(())
}

fn report_caught(lab: &Lab, error: &JsError) {
    lab.log(format!(
        "Caught error: {}\nCall Stack:\n{}",
        error.message,
        error.stack_trace()
    ));
}

pub(crate) fn sync_error_stack(lab: &Lab) -> Result<(), JsError> {
    let error_func = || -> Result<(), JsError> {
        lab.call("errorFunc", || {
            Err(lab.new_error(ErrorKind::Error, "I have a call stack that makes sense!"))
        })
    };

    lab.log("Start event loop");
    if let Err(e) = error_func() {
        report_caught(lab, &e);
    }
    Ok(())
}

fn func_a(lab: &Lab) -> Result<(), JsError> {
    lab.call("funcA", || {
        lab.log("do stuff");
        func_b(lab)
    })
}

fn func_b(lab: &Lab) -> Result<(), JsError> {
    lab.call("funcB", || {
        lab.log("Do more stuff");
        func_c(lab)
    })
}

fn func_c(lab: &Lab) -> Result<(), JsError> {
    lab.call("funcC", || {
        lab.log("fail with an error");
        Err(lab.new_error(ErrorKind::Error, ""))
    })
}

pub(crate) fn nested_error_stack(lab: &Lab) -> Result<(), JsError> {
    lab.log("Start event loop");
    if let Err(e) = func_a(lab) {
        report_caught(lab, &e);
    }
    Ok(())
}

type Step = fn(&Lab) -> Result<(), JsError>;

pub(crate) fn try_around_definitions(lab: &Lab) -> Result<(), JsError> {
    // Only binding the functions is guarded, and the bindings end with the block.
    let guarded: Result<[Step; 3], JsError> = Ok([func_a, func_b, func_c]);
    if guarded.is_err() {
        lab.log("Handling error!");
    }
    Err(lab.new_error(ErrorKind::ReferenceError, "funcA is not defined"))
}

pub(crate) fn try_around_rejection(lab: &Lab) -> Result<(), JsError> {
    let attempt: Result<Promise, JsError> =
        Ok(Promise::rejected(lab, JsError::thrown(Value::Undefined)));
    if attempt.is_err() {
        lab.log("Handling error!");
    }
    Ok(())
}

fn async_func_that_throws_error(lab: &Lab) {
    let inner = lab.clone();
    lab.set_timeout(ms(5), move || Err(inner.new_error(ErrorKind::Error, "HI")));
}

pub(crate) fn try_around_timer(lab: &Lab) -> Result<(), JsError> {
    let attempt: Result<(), JsError> = {
        async_func_that_throws_error(lab);
        Ok(())
    };
    if attempt.is_err() {
        lab.log("Handling error!");
    }
    Ok(())
}

/// A promise resolved after 30 ms with the virtual time it was created at.
fn async_func_that_eventually_resolves(lab: &Lab) -> Promise {
    let start_ms = lab.now().as_millis() as f64;
    Promise::new(lab, move |resolvers| {
        let inner = lab.clone();
        lab.set_timeout(ms(30), move || {
            inner.log("The promise is now resolved");
            resolvers.resolve(Value::Double(start_ms));
            Ok(())
        });
        Ok(())
    })
}

pub(crate) fn then_after_timer(lab: &Lab) -> Result<(), JsError> {
    lab.log("Started!");
    let inner = lab.clone();
    let _p = async_func_that_eventually_resolves(lab).then(move |_| {
        inner.log("the promise resolved and the .then block executed");
        Ok(Value::Undefined)
    });
    lab.log("This will run in the meantime");
    Ok(())
}

pub(crate) fn busy_loop_starvation(lab: &Lab) -> Result<(), JsError> {
    let exit_condition = Rc::new(Cell::new(false));

    lab.log("Promise started");
    let inner = lab.clone();
    let flag = exit_condition.clone();
    let p = async_func_that_eventually_resolves(lab).then(move |start| {
        inner.log("The .then block is executed!");
        flag.set(true);
        let started = start.as_number().unwrap_or(0.0);
        let took = inner.now().as_millis() as f64 - started;
        inner.log(format!(
            "Took {}ms for the promise to resolve, because the while loop was keeping the engine busy",
            Value::Double(took)
        ));
        Ok(Value::Undefined)
    });
    lab.log(format!(
        "This code will run while the promise is still pending: {}",
        p.to_js_string()
    ));

    let mut i = 0;
    while !exit_condition.get() && i < BUSY_LOOP_LIMIT {
        i += 1;
        if i % ITERATIONS_PER_MS == 0 {
            lab.burn_cpu(ms(1));
        }
    }
    lab.log(format!("The while loop counted to {}!", i));
    lab.log(&p);
    lab.log("Now that the engine has run out of code, the promise will now resolve");
    Ok(())
}

/// Schedules a failure at a random time; the promise never settles.
fn async_func_that_rejects_after_random_amount_of_time(lab: &Lab) -> Promise {
    Promise::new(lab, |_resolvers| {
        let rand_time = lab.random_delay(1000);
        let string = Value::array(Vec::<Value>::new());
        let inner = lab.clone();
        lab.set_timeout(rand_time, move || {
            split(&inner, &string)?;
            Ok(())
        });
        Ok(())
    })
}

/// `string.split()` on a value that has no `split` method.
fn split(lab: &Lab, string: &Value) -> Result<Value, JsError> {
    match string.get("split")? {
        Value::Undefined => Err(lab.new_error(
            ErrorKind::TypeError,
            "string.split is not a function",
        )),
        other => Ok(other),
    }
}

fn run_async(lab: &Lab, frame: &str, label: char) -> Result<(), JsError> {
    lab.call(frame, || {
        let attempt: Result<Promise, JsError> = {
            lab.log(format!("Run Async {}", label));
            Ok(async_func_that_rejects_after_random_amount_of_time(lab))
        };
        if attempt.is_err() {
            lab.log(format!("Handling error from Async {}!", label));
        }
        Ok(())
    })
}

pub(crate) fn lost_stack_trace(lab: &Lab) -> Result<(), JsError> {
    let attempt = run_async(lab, "funcA", 'A')
        .and_then(|_| run_async(lab, "funcB", 'B'))
        .and_then(|_| run_async(lab, "funcC", 'C'));
    if attempt.is_err() {
        lab.log("Handling error from one of the async calls!");
    }
    Ok(())
}

/// Resolves with `obj.arr[4].length` after a random delay.
///
/// The lookup runs inside the timer callback, so a failing lookup throws on
/// the timer's stack instead of rejecting the promise.
fn get_length_from_object(lab: &Lab, obj: Value) -> Promise {
    let rand = lab.random_delay(1000);
    Promise::new(lab, move |resolvers| {
        let inner = lab.clone();
        lab.set_timeout(rand, move || {
            let length = obj
                .get("arr")
                .and_then(|arr| arr.get("4"))
                .and_then(|item| item.get("length"))
                .map_err(|e| e.with_stack(inner.stack()))?;
            resolvers.resolve(length);
            Ok(())
        });
        Ok(())
    })
}

pub(crate) fn which_call_failed(lab: &Lab) -> Result<(), JsError> {
    let obj1 = Value::object([(
        "arr",
        Value::array([Value::Smi(1), Value::Smi(2), Value::Smi(3), Value::Smi(4)]),
    )]);
    let obj2 = Value::object([("arr", Value::object([("4", Value::string("string"))]))]);
    let obj3 = Value::object([(
        "Arr",
        Value::object([("4", Value::object([("length", Value::Null)]))]),
    )]);

    let attempt: Result<(), JsError> = {
        for (n, obj) in [(1, obj1), (2, obj2), (3, obj3)] {
            let inner = lab.clone();
            get_length_from_object(lab, obj).catch(move |e| {
                inner.log(format!("{} failed due with{}", n, e.message));
                Ok(Value::Undefined)
            });
        }
        Ok(())
    };
    if let Err(e) = attempt {
        lab.log(format!("1, 2 or 3 failed with {}", e.message));
    }
    Ok(())
}
