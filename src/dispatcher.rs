//! Dispatcher - the public entry point.
//!
//! One call runs `Resolving -> Building -> Executing`: look up the handler
//! and behaviors for the request's type, compose the chain, invoke it
//! exactly once. A failure in any stage surfaces immediately; nothing is
//! retried at this layer.
//!
//! The dispatcher is stateless and reentrant: it holds only a shared
//! reference to its resolver, so clones are cheap and concurrent calls
//! never observe each other's chains.
//!
//! # Example
//!
//! ```ignore
//! use reqwire::{Dispatcher, Registry, Request};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! struct GetUser {
//!     id: u64,
//! }
//!
//! impl Request for GetUser {
//!     type Response = String;
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Registry::builder()
//!         .bind_fn(|req: Arc<GetUser>, _signal| async move { Ok(format!("user-{}", req.id)) })
//!         .build()?;
//!
//!     let dispatcher = Dispatcher::new(registry);
//!     let name = dispatcher
//!         .dispatch(GetUser { id: 7 }, CancellationToken::new())
//!         .await?;
//!     assert_eq!(name, "user-7");
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::chain;
use crate::error::{DispatchError, Result};
use crate::handler::{Behavior, Handler};
use crate::notify::{Notification, Subscriber};
use crate::registry::Registry;
use crate::request::Request;
use crate::resolver::{self, CapabilityKey, Resolver};

/// Routes requests through resolution, composition, and execution.
pub struct Dispatcher<S = Registry> {
    resolver: Arc<S>,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<S: Resolver> Dispatcher<S> {
    /// Create a dispatcher over the given resolver.
    pub fn new(resolver: S) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Create a dispatcher over an already shared resolver.
    pub fn from_arc(resolver: Arc<S>) -> Self {
        Self { resolver }
    }

    /// Dispatch a request and await its response.
    ///
    /// The cancellation signal is threaded unchanged to every behavior and
    /// the handler; the dispatcher itself never observes it, so a
    /// pre-canceled token still resolves and builds the chain - aborting
    /// is each link's responsibility.
    ///
    /// # Errors
    ///
    /// Resolution failures are reported with the request type name:
    /// a missing binding, a construction failure (original cause
    /// retained), an ambiguous binding, or a mistyped capability. Errors
    /// raised inside the chain pass through unmodified.
    pub async fn dispatch<R: Request>(
        &self,
        request: R,
        signal: CancellationToken,
    ) -> Result<R::Response> {
        let request_type = std::any::type_name::<R>();
        tracing::trace!("dispatching {}", request_type);

        let (handler, behaviors) = match self.resolve::<R>() {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::debug!("resolution failed for {}: {}", request_type, e);
                return Err(e);
            }
        };

        let chain = chain::compose(handler, behaviors, Arc::new(request), signal);

        match chain().await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::debug!("chain failed for {}: {}", request_type, e);
                Err(DispatchError::Chain(e))
            }
        }
    }

    /// Publish a notification to its subscribers.
    ///
    /// Subscribers run sequentially in registration order; the first
    /// failure stops the sequence and passes through unmodified. Zero
    /// subscribers is a no-op.
    pub async fn publish<N: Notification>(
        &self,
        notification: N,
        signal: CancellationToken,
    ) -> Result<()> {
        let key = CapabilityKey::subscribers::<N>();
        let slots = self
            .resolver
            .resolve_all(&key)
            .map_err(|failure| failure.into_dispatch(key.message_type()))?;

        let mut subscribers: Vec<Arc<dyn Subscriber<N>>> = Vec::with_capacity(slots.len());
        for slot in &slots {
            subscribers.push(resolver::downcast_subscriber::<N>(slot).ok_or(
                DispatchError::CapabilityMismatch {
                    request_type: key.message_type(),
                },
            )?);
        }

        tracing::trace!(
            "publishing {} to {} subscribers",
            key.message_type(),
            subscribers.len()
        );

        let notification = Arc::new(notification);
        for subscriber in subscribers {
            subscriber
                .notify(Arc::clone(&notification), signal.clone())
                .await
                .map_err(DispatchError::Chain)?;
        }
        Ok(())
    }

    /// Resolve the handler and behaviors for one dispatch.
    ///
    /// Resolution happens once per call; instances are never cached here.
    #[allow(clippy::type_complexity)]
    fn resolve<R: Request>(&self) -> Result<(Arc<dyn Handler<R>>, Vec<Arc<dyn Behavior<R>>>)> {
        let handler_key = CapabilityKey::handler::<R>();
        let request_type = handler_key.message_type();

        let slot = self
            .resolver
            .resolve_one(&handler_key)
            .map_err(|failure| failure.into_dispatch(request_type))?
            .ok_or(DispatchError::HandlerNotRegistered { request_type })?;
        let handler = resolver::downcast_handler::<R>(&slot)
            .ok_or(DispatchError::CapabilityMismatch { request_type })?;

        let behavior_key = CapabilityKey::behaviors::<R>();
        let slots = self
            .resolver
            .resolve_all(&behavior_key)
            .map_err(|failure| failure.into_dispatch(request_type))?;

        let mut behaviors: Vec<Arc<dyn Behavior<R>>> = Vec::with_capacity(slots.len());
        for slot in &slots {
            behaviors.push(
                resolver::downcast_behavior::<R>(slot)
                    .ok_or(DispatchError::CapabilityMismatch { request_type })?,
            );
        }

        Ok((handler, behaviors))
    }
}
