//! Completion callbacks and callback nesting.

use crate::Lab;
use core_types::JsError;

/// Calls a simulated remote service and runs `done` when it completes.
///
/// The call takes a random latency below one second.
fn async_func<F>(lab: &Lab, service: &'static str, done: F)
where
    F: FnOnce(&Lab) -> Result<(), JsError> + 'static,
{
    let latency = lab.random_delay(1000);
    lab.log(format!("{} begun", service));
    let inner = lab.clone();
    lab.set_timeout(latency, move || {
        inner.log(format!("{} completed", service));
        done(&inner)
    });
}

pub(crate) fn callback_hell(lab: &Lab) -> Result<(), JsError> {
    lab.log("Start of callback hell");
    async_func(lab, "Start Server", |lab| {
        async_func(lab, "Call Service 1", |lab| {
            async_func(lab, "Call Service 2", |lab| {
                async_func(lab, "Call Service 3", |lab| {
                    lab.log("Services called!");
                    Ok(())
                });
                Ok(())
            });
            Ok(())
        });
        Ok(())
    });
    Ok(())
}

pub(crate) fn callback_hell_numbered(lab: &Lab) -> Result<(), JsError> {
    lab.log("Start of callback hell");
    async_func(lab, "Start Server", |lab| {
        lab.log("2");
        async_func(lab, "Call Service 1", |lab| {
            lab.log("4");
            async_func(lab, "Call Service 2", |lab| {
                lab.log("6");
                async_func(lab, "Call Service 3", |lab| {
                    lab.log("8");
                    Ok(())
                });
                lab.log("7");
                Ok(())
            });
            lab.log("5");
            Ok(())
        });
        lab.log("3");
        Ok(())
    });
    lab.log("this will run first of all?? Starting with 1");
    Ok(())
}

pub(crate) fn callback_parallel(lab: &Lab) -> Result<(), JsError> {
    lab.log("start of callback hell");
    async_func(lab, "Start Server", |lab| {
        for (service, n) in [
            ("Call Service 1", 1),
            ("Call Service 2", 2),
            ("Call Service 3", 3),
        ] {
            async_func(lab, service, move |lab| {
                lab.log(format!(
                    "Now work can be done on the results of the call to Service {}",
                    n
                ));
                Ok(())
            });
        }
        Ok(())
    });
    lab.log("This code will run before despite being written at the end!");
    Ok(())
}
