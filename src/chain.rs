//! Chain composition - folding behaviors around the terminal handler.
//!
//! A chain is ephemeral: built fresh on every dispatch, owned by that call,
//! and discarded after execution. Composition is pure closure construction;
//! no behavior or handler code runs until the returned continuation is
//! invoked.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::handler::{Behavior, Handler, Next};
use crate::request::Request;

/// Compose behaviors and the terminal handler into one continuation.
///
/// The handler invocation is the innermost link. Behaviors are folded
/// around it in reverse registration order, so the first-registered
/// behavior ends up outermost: it runs first on the way in and last on the
/// way out, with each behavior's `next` invoking the link inward of it.
///
/// Every link captures the same request and the same cancellation token
/// instance; the chain neither clones the request nor re-derives the
/// token.
pub fn compose<R: Request>(
    handler: Arc<dyn Handler<R>>,
    behaviors: Vec<Arc<dyn Behavior<R>>>,
    request: Arc<R>,
    signal: CancellationToken,
) -> Next<R::Response> {
    let core_request = Arc::clone(&request);
    let core_signal = signal.clone();
    let core: Next<R::Response> = Box::new(move || handler.handle(core_request, core_signal));

    behaviors.into_iter().rev().fold(core, |next, behavior| {
        let request = Arc::clone(&request);
        let signal = signal.clone();
        Box::new(move || behavior.handle(request, signal, next))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{FnBehavior, FnHandler};
    use std::sync::Mutex;

    struct Probe;

    impl Request for Probe {
        type Response = u32;
    }

    type Trace = Arc<Mutex<Vec<&'static str>>>;

    fn tracing_handler(trace: Trace) -> Arc<dyn Handler<Probe>> {
        Arc::new(FnHandler::new(move |_req: Arc<Probe>, _signal| {
            let trace = Arc::clone(&trace);
            async move {
                trace.lock().unwrap().push("H");
                Ok(0)
            }
        }))
    }

    fn tracing_behavior(label: &'static str, trace: Trace) -> Arc<dyn Behavior<Probe>> {
        Arc::new(FnBehavior::new(
            move |_req: Arc<Probe>, _signal, next: Next<u32>| {
                let trace = Arc::clone(&trace);
                async move {
                    trace.lock().unwrap().push(label);
                    let out = next().await;
                    trace.lock().unwrap().push(label);
                    out
                }
            },
        ))
    }

    #[tokio::test]
    async fn test_onion_ordering() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));

        let chain = compose(
            tracing_handler(Arc::clone(&trace)),
            vec![
                tracing_behavior("B1", Arc::clone(&trace)),
                tracing_behavior("B2", Arc::clone(&trace)),
                tracing_behavior("B3", Arc::clone(&trace)),
            ],
            Arc::new(Probe),
            CancellationToken::new(),
        );

        chain().await.unwrap();

        assert_eq!(
            *trace.lock().unwrap(),
            vec!["B1", "B2", "B3", "H", "B3", "B2", "B1"]
        );
    }

    #[tokio::test]
    async fn test_composition_is_lazy() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));

        let chain = compose(
            tracing_handler(Arc::clone(&trace)),
            vec![tracing_behavior("B1", Arc::clone(&trace))],
            Arc::new(Probe),
            CancellationToken::new(),
        );

        // Nothing may run during construction.
        assert!(trace.lock().unwrap().is_empty());

        chain().await.unwrap();
        assert_eq!(*trace.lock().unwrap(), vec!["B1", "H", "B1"]);
    }

    #[tokio::test]
    async fn test_zero_behaviors_is_just_the_handler() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));

        let chain = compose(
            tracing_handler(Arc::clone(&trace)),
            Vec::new(),
            Arc::new(Probe),
            CancellationToken::new(),
        );

        let out = chain().await.unwrap();
        assert_eq!(out, 0);
        assert_eq!(*trace.lock().unwrap(), vec!["H"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_inner_links() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let gate: Arc<dyn Behavior<Probe>> = Arc::new(FnBehavior::new(
            |_req: Arc<Probe>, _signal, _next: Next<u32>| async move { Ok(99) },
        ));

        let chain = compose(
            tracing_handler(Arc::clone(&trace)),
            vec![
                tracing_behavior("B1", Arc::clone(&trace)),
                gate,
                tracing_behavior("B3", Arc::clone(&trace)),
            ],
            Arc::new(Probe),
            CancellationToken::new(),
        );

        let out = chain().await.unwrap();

        // The gate's value is the final response; B3 and the handler never ran.
        assert_eq!(out, 99);
        assert_eq!(*trace.lock().unwrap(), vec!["B1", "B1"]);
    }

    #[tokio::test]
    async fn test_same_signal_reaches_every_link() {
        let signal = CancellationToken::new();
        signal.cancel();

        let seen: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));

        let seen_handler = Arc::clone(&seen);
        let handler: Arc<dyn Handler<Probe>> = Arc::new(FnHandler::new(
            move |_req: Arc<Probe>, signal: CancellationToken| {
                let seen = Arc::clone(&seen_handler);
                async move {
                    seen.lock().unwrap().push(signal.is_cancelled());
                    Ok(0)
                }
            },
        ));

        let seen_behavior = Arc::clone(&seen);
        let behavior: Arc<dyn Behavior<Probe>> = Arc::new(FnBehavior::new(
            move |_req: Arc<Probe>, signal: CancellationToken, next: Next<u32>| {
                let seen = Arc::clone(&seen_behavior);
                async move {
                    seen.lock().unwrap().push(signal.is_cancelled());
                    next().await
                }
            },
        ));

        let chain = compose(handler, vec![behavior], Arc::new(Probe), signal);
        chain().await.unwrap();

        // Pre-canceled token passes through unchanged; the chain still ran.
        assert_eq!(*seen.lock().unwrap(), vec![true, true]);
    }
}
