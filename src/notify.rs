//! Notifications - fire-and-forget events with any number of subscribers.
//!
//! Requests resolve to exactly one handler; notifications fan out to zero
//! or more [`Subscriber`]s instead and produce no response. Subscribers
//! run sequentially in registration order, and the first failure stops the
//! sequence. Behaviors do not apply to notifications.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::ChainResult;
use crate::handler::BoxFuture;

/// A published event. Unlike a request, it has no response type and no
/// single-owner invariant: any number of subscribers may observe it.
pub trait Notification: Send + Sync + 'static {}

/// A capability that observes one notification type.
pub trait Subscriber<N: Notification>: Send + Sync + 'static {
    /// Observe a notification.
    fn notify(
        &self,
        notification: Arc<N>,
        signal: CancellationToken,
    ) -> BoxFuture<'static, ChainResult<()>>;
}

/// Wrapper that adapts an async closure into a [`Subscriber`].
pub struct FnSubscriber<F, N, Fut>
where
    F: Fn(Arc<N>, CancellationToken) -> Fut + Send + Sync + 'static,
    N: Notification,
    Fut: Future<Output = ChainResult<()>> + Send + 'static,
{
    subscriber: F,
    _phantom: PhantomData<fn(N) -> Fut>,
}

impl<F, N, Fut> FnSubscriber<F, N, Fut>
where
    F: Fn(Arc<N>, CancellationToken) -> Fut + Send + Sync + 'static,
    N: Notification,
    Fut: Future<Output = ChainResult<()>> + Send + 'static,
{
    /// Create a new closure-backed subscriber.
    pub fn new(subscriber: F) -> Self {
        Self {
            subscriber,
            _phantom: PhantomData,
        }
    }
}

impl<F, N, Fut> Subscriber<N> for FnSubscriber<F, N, Fut>
where
    F: Fn(Arc<N>, CancellationToken) -> Fut + Send + Sync + 'static,
    N: Notification,
    Fut: Future<Output = ChainResult<()>> + Send + 'static,
{
    fn notify(
        &self,
        notification: Arc<N>,
        signal: CancellationToken,
    ) -> BoxFuture<'static, ChainResult<()>> {
        Box::pin((self.subscriber)(notification, signal))
    }
}
