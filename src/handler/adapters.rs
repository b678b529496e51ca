//! Closure adapters for the capability traits.
//!
//! Implementing [`Handler`] or [`Behavior`] by hand means boxing futures
//! manually. These adapters wrap plain async closures instead, and are
//! what the registry's `bind_fn` / `behavior_fn` sugar uses.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{Behavior, BoxFuture, Handler, Next};
use crate::error::ChainResult;
use crate::request::Request;

/// Wrapper that adapts an async closure into a [`Handler`].
pub struct FnHandler<F, R, Fut>
where
    F: Fn(Arc<R>, CancellationToken) -> Fut + Send + Sync + 'static,
    R: Request,
    Fut: Future<Output = ChainResult<R::Response>> + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn(R) -> Fut>,
}

impl<F, R, Fut> FnHandler<F, R, Fut>
where
    F: Fn(Arc<R>, CancellationToken) -> Fut + Send + Sync + 'static,
    R: Request,
    Fut: Future<Output = ChainResult<R::Response>> + Send + 'static,
{
    /// Create a new closure-backed handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, R, Fut> Handler<R> for FnHandler<F, R, Fut>
where
    F: Fn(Arc<R>, CancellationToken) -> Fut + Send + Sync + 'static,
    R: Request,
    Fut: Future<Output = ChainResult<R::Response>> + Send + 'static,
{
    fn handle(
        &self,
        request: Arc<R>,
        signal: CancellationToken,
    ) -> BoxFuture<'static, ChainResult<R::Response>> {
        Box::pin((self.handler)(request, signal))
    }
}

/// Wrapper that adapts an async closure into a [`Behavior`].
pub struct FnBehavior<F, R, Fut>
where
    F: Fn(Arc<R>, CancellationToken, Next<R::Response>) -> Fut + Send + Sync + 'static,
    R: Request,
    Fut: Future<Output = ChainResult<R::Response>> + Send + 'static,
{
    behavior: F,
    _phantom: PhantomData<fn(R) -> Fut>,
}

impl<F, R, Fut> FnBehavior<F, R, Fut>
where
    F: Fn(Arc<R>, CancellationToken, Next<R::Response>) -> Fut + Send + Sync + 'static,
    R: Request,
    Fut: Future<Output = ChainResult<R::Response>> + Send + 'static,
{
    /// Create a new closure-backed behavior.
    pub fn new(behavior: F) -> Self {
        Self {
            behavior,
            _phantom: PhantomData,
        }
    }
}

impl<F, R, Fut> Behavior<R> for FnBehavior<F, R, Fut>
where
    F: Fn(Arc<R>, CancellationToken, Next<R::Response>) -> Fut + Send + Sync + 'static,
    R: Request,
    Fut: Future<Output = ChainResult<R::Response>> + Send + 'static,
{
    fn handle(
        &self,
        request: Arc<R>,
        signal: CancellationToken,
        next: Next<R::Response>,
    ) -> BoxFuture<'static, ChainResult<R::Response>> {
        Box::pin((self.behavior)(request, signal, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Double(u32);

    impl Request for Double {
        type Response = u32;
    }

    #[tokio::test]
    async fn test_fn_handler_invokes_closure() {
        let handler = FnHandler::new(|req: Arc<Double>, _signal| async move { Ok(req.0 * 2) });

        let out = handler
            .handle(Arc::new(Double(21)), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn test_fn_behavior_calls_next() {
        let behavior = FnBehavior::new(
            |_req: Arc<Double>, _signal, next: Next<u32>| async move {
                let inner = next().await?;
                Ok(inner + 1)
            },
        );

        let next: Next<u32> = Box::new(|| Box::pin(async { Ok(10) }));
        let out = behavior
            .handle(Arc::new(Double(0)), CancellationToken::new(), next)
            .await
            .unwrap();
        assert_eq!(out, 11);
    }

    #[tokio::test]
    async fn test_fn_behavior_short_circuit() {
        let behavior = FnBehavior::new(
            |_req: Arc<Double>, _signal, _next: Next<u32>| async move { Ok(0) },
        );

        let next: Next<u32> = Box::new(|| Box::pin(async { panic!("must not run") }));
        let out = behavior
            .handle(Arc::new(Double(5)), CancellationToken::new(), next)
            .await
            .unwrap();
        assert_eq!(out, 0);
    }
}
