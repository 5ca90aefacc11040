//! Promise construction, `then` and `catch`.

use crate::{ms, Lab};
use async_runtime::Promise;
use core_types::{ErrorKind, JsError, Value};

/// A promise settled by a 5 ms timer, rejected if `reject_me` is set.
///
/// `reject()` with no reason rejects with a bare `Error`.
fn settle_after_timer(lab: &Lab, reject_me: bool) -> Promise {
    Promise::new(lab, move |resolvers| {
        lab.set_timeout(ms(5), move || {
            if reject_me {
                resolvers.reject(JsError::thrown(Value::Undefined));
            } else {
                resolvers.resolve(Value::Undefined);
            }
            Ok(())
        });
        Ok(())
    })
}

fn describe(lab: &Lab, p: &Promise) {
    lab.log(format!(
        "P stringified is {}. Type of p is object",
        p.to_js_string()
    ));
}

pub(crate) fn promise_pending(lab: &Lab) -> Result<(), JsError> {
    let p = settle_after_timer(lab, false);
    describe(lab, &p);
    Ok(())
}

pub(crate) fn promise_unhandled_reject(lab: &Lab) -> Result<(), JsError> {
    let p = settle_after_timer(lab, true);
    describe(lab, &p);
    Ok(())
}

pub(crate) fn promise_then(lab: &Lab) -> Result<(), JsError> {
    let inner = lab.clone();
    settle_after_timer(lab, false).then(move |_| {
        inner.log("Executed after promise is resolved");
        Ok(Value::Undefined)
    });
    Ok(())
}

pub(crate) fn promise_catch(lab: &Lab) -> Result<(), JsError> {
    let inner = lab.clone();
    settle_after_timer(lab, true).catch(move |_| {
        inner.log("Executed after promise is rejected");
        Ok(Value::Undefined)
    });
    Ok(())
}

/// The executor hands nothing to the timer; the throw happens on the timer's
/// own stack, so the promise stays pending forever.
fn reject_by_throwing_error(lab: &Lab) -> Promise {
    Promise::new(lab, |_resolvers| {
        let inner = lab.clone();
        lab.set_timeout(ms(5), move || {
            Err(inner.new_error(ErrorKind::Error, "From promise"))
        });
        Ok(())
    })
}

pub(crate) fn promise_throw_in_timer(lab: &Lab) -> Result<(), JsError> {
    let inner = lab.clone();
    reject_by_throwing_error(lab).catch(move |_| {
        inner.log("Executed after promise is rejected");
        Ok(Value::Undefined)
    });
    Ok(())
}
