//! Registry - the stock resolver, built at startup.
//!
//! A typed lookup table mapping each request type to one handler factory
//! and an ordered list of behavior factories (and each notification type
//! to its subscribers). Built once through [`RegistryBuilder`], immutable
//! afterwards.
//!
//! Binding a second handler for the same request type is rejected by
//! [`RegistryBuilder::build`] with an ambiguity error rather than silently
//! picking one. Factories run once per dispatch; instance binds hand out
//! clones of one shared `Arc`, so instance ownership stays with the
//! registry, never with a chain.
//!
//! # Example
//!
//! ```
//! use reqwire::{Registry, Request};
//! use std::sync::Arc;
//!
//! struct GetUser {
//!     id: u64,
//! }
//!
//! impl Request for GetUser {
//!     type Response = String;
//! }
//!
//! let registry = Registry::builder()
//!     .bind_fn(|req: Arc<GetUser>, _signal| async move { Ok(format!("user-{}", req.id)) })
//!     .build()
//!     .unwrap();
//!
//! assert!(registry.has_handler::<GetUser>());
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{BoxError, ChainResult, DispatchError};
use crate::handler::{Behavior, FnBehavior, FnHandler, Handler, Next};
use crate::notify::{FnSubscriber, Notification, Subscriber};
use crate::request::Request;
use crate::resolver::{
    behavior_slot, handler_slot, subscriber_slot, CapabilityKey, CapabilityKind, InstanceSlot,
    Resolver, ResolveFailure,
};

/// Factory producing one erased capability instance per dispatch.
type SlotFactory = Box<dyn Fn() -> std::result::Result<InstanceSlot, BoxError> + Send + Sync>;

/// Everything bound to one message type.
struct Binding {
    message_type: &'static str,
    handlers: Vec<SlotFactory>,
    behaviors: Vec<SlotFactory>,
    subscribers: Vec<SlotFactory>,
}

impl Binding {
    fn new(message_type: &'static str) -> Self {
        Self {
            message_type,
            handlers: Vec::new(),
            behaviors: Vec::new(),
            subscribers: Vec::new(),
        }
    }
}

/// Builder for configuring a [`Registry`].
///
/// Use the fluent API to bind handlers, behaviors, and subscribers, then
/// call `build()` to validate the bindings.
pub struct RegistryBuilder {
    bindings: HashMap<TypeId, Binding>,
}

impl RegistryBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    fn entry<T: 'static>(&mut self) -> &mut Binding {
        self.bindings
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Binding::new(std::any::type_name::<T>()))
    }

    /// Bind a shared handler instance for request type `R`.
    ///
    /// Every dispatch of `R` receives a clone of the same `Arc`.
    pub fn bind<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: Handler<R>,
    {
        let shared: Arc<dyn Handler<R>> = Arc::new(handler);
        self.entry::<R>()
            .handlers
            .push(Box::new(move || Ok(handler_slot::<R>(Arc::clone(&shared)))));
        self
    }

    /// Bind a fallible handler factory for request type `R`.
    ///
    /// The factory runs once per dispatch; a factory error surfaces as a
    /// handler construction failure carrying its cause.
    pub fn bind_with<R, H, F>(mut self, factory: F) -> Self
    where
        R: Request,
        H: Handler<R>,
        F: Fn() -> std::result::Result<H, BoxError> + Send + Sync + 'static,
    {
        self.entry::<R>().handlers.push(Box::new(move || {
            let handler = factory()?;
            Ok(handler_slot::<R>(Arc::new(handler)))
        }));
        self
    }

    /// Bind an async closure as the handler for request type `R`.
    pub fn bind_fn<R, F, Fut>(self, handler: F) -> Self
    where
        R: Request,
        F: Fn(Arc<R>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ChainResult<R::Response>> + Send + 'static,
    {
        self.bind(FnHandler::new(handler))
    }

    /// Append a shared behavior instance for request type `R`.
    ///
    /// Registration order is significant: the first-registered behavior is
    /// outermost at dispatch time.
    pub fn behavior<R, B>(mut self, behavior: B) -> Self
    where
        R: Request,
        B: Behavior<R>,
    {
        let shared: Arc<dyn Behavior<R>> = Arc::new(behavior);
        self.entry::<R>()
            .behaviors
            .push(Box::new(move || Ok(behavior_slot::<R>(Arc::clone(&shared)))));
        self
    }

    /// Append a fallible behavior factory for request type `R`.
    pub fn behavior_with<R, B, F>(mut self, factory: F) -> Self
    where
        R: Request,
        B: Behavior<R>,
        F: Fn() -> std::result::Result<B, BoxError> + Send + Sync + 'static,
    {
        self.entry::<R>().behaviors.push(Box::new(move || {
            let behavior = factory()?;
            Ok(behavior_slot::<R>(Arc::new(behavior)))
        }));
        self
    }

    /// Append an async closure as a behavior for request type `R`.
    pub fn behavior_fn<R, F, Fut>(self, behavior: F) -> Self
    where
        R: Request,
        F: Fn(Arc<R>, CancellationToken, Next<R::Response>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ChainResult<R::Response>> + Send + 'static,
    {
        self.behavior(FnBehavior::new(behavior))
    }

    /// Append a shared subscriber for notification type `N`.
    ///
    /// Subscribers are notified sequentially in registration order.
    pub fn subscribe<N, S>(mut self, subscriber: S) -> Self
    where
        N: Notification,
        S: Subscriber<N>,
    {
        let shared: Arc<dyn Subscriber<N>> = Arc::new(subscriber);
        self.entry::<N>()
            .subscribers
            .push(Box::new(move || Ok(subscriber_slot::<N>(Arc::clone(&shared)))));
        self
    }

    /// Append an async closure as a subscriber for notification type `N`.
    pub fn subscribe_fn<N, F, Fut>(self, subscriber: F) -> Self
    where
        N: Notification,
        F: Fn(Arc<N>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ChainResult<()>> + Send + 'static,
    {
        self.subscribe(FnSubscriber::new(subscriber))
    }

    /// Validate the bindings and build the registry.
    ///
    /// # Errors
    ///
    /// Returns an ambiguity error if any request type has more than one
    /// bound handler.
    pub fn build(self) -> crate::error::Result<Registry> {
        for binding in self.bindings.values() {
            if binding.handlers.len() > 1 {
                return Err(DispatchError::AmbiguousBinding {
                    request_type: binding.message_type,
                    bindings: binding.handlers.len(),
                });
            }
        }
        Ok(Registry {
            bindings: self.bindings,
        })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable lookup table of handlers, behaviors, and subscribers.
pub struct Registry {
    bindings: HashMap<TypeId, Binding>,
}

impl Registry {
    /// Create a new registry builder.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// True if a handler is bound for request type `R`.
    pub fn has_handler<R: Request>(&self) -> bool {
        self.bindings
            .get(&TypeId::of::<R>())
            .is_some_and(|binding| !binding.handlers.is_empty())
    }

    /// Number of behaviors bound for request type `R`.
    pub fn behavior_count<R: Request>(&self) -> usize {
        self.bindings
            .get(&TypeId::of::<R>())
            .map_or(0, |binding| binding.behaviors.len())
    }

    /// Number of subscribers bound for notification type `N`.
    pub fn subscriber_count<N: Notification>(&self) -> usize {
        self.bindings
            .get(&TypeId::of::<N>())
            .map_or(0, |binding| binding.subscribers.len())
    }

    fn factories(&self, key: &CapabilityKey) -> &[SlotFactory] {
        match self.bindings.get(&key.message()) {
            None => &[],
            Some(binding) => match key.kind() {
                CapabilityKind::Handler => &binding.handlers,
                CapabilityKind::Behavior => &binding.behaviors,
                CapabilityKind::Subscriber => &binding.subscribers,
            },
        }
    }
}

impl Resolver for Registry {
    fn resolve_one(
        &self,
        key: &CapabilityKey,
    ) -> std::result::Result<Option<InstanceSlot>, ResolveFailure> {
        let factories = self.factories(key);
        match factories {
            [] => Ok(None),
            [factory] => factory().map(Some).map_err(ResolveFailure::Construction),
            _ => Err(ResolveFailure::Ambiguous {
                bindings: factories.len(),
            }),
        }
    }

    fn resolve_all(
        &self,
        key: &CapabilityKey,
    ) -> std::result::Result<Vec<InstanceSlot>, ResolveFailure> {
        self.factories(key)
            .iter()
            .map(|factory| factory().map_err(ResolveFailure::Construction))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo(String);

    impl Request for Echo {
        type Response = String;
    }

    struct Tick;

    impl Notification for Tick {}

    fn echo_builder() -> RegistryBuilder {
        Registry::builder().bind_fn(|req: Arc<Echo>, _signal| async move { Ok(req.0.clone()) })
    }

    #[test]
    fn test_bind_and_probe() {
        let registry = echo_builder().build().unwrap();

        assert!(registry.has_handler::<Echo>());
        assert_eq!(registry.behavior_count::<Echo>(), 0);
    }

    #[test]
    fn test_duplicate_bind_rejected_at_build() {
        let result = echo_builder()
            .bind_fn(|req: Arc<Echo>, _signal| async move { Ok(req.0.clone()) })
            .build();

        let err = result.err().expect("second bind must be rejected");
        assert!(err.is_ambiguous());
        assert!(err.request_type().unwrap().contains("Echo"));
    }

    #[test]
    fn test_behavior_registration_order_preserved() {
        let registry = echo_builder()
            .behavior_fn(|_req: Arc<Echo>, _signal, next| async move { next().await })
            .behavior_fn(|_req: Arc<Echo>, _signal, next| async move { next().await })
            .behavior_fn(|_req: Arc<Echo>, _signal, next| async move { next().await })
            .build()
            .unwrap();

        assert_eq!(registry.behavior_count::<Echo>(), 3);

        let slots = registry
            .resolve_all(&CapabilityKey::behaviors::<Echo>())
            .unwrap();
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn test_resolve_one_absent() {
        let registry = Registry::builder().build().unwrap();

        let resolved = registry
            .resolve_one(&CapabilityKey::handler::<Echo>())
            .unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_factory_runs_once_per_resolution() {
        let built = Arc::new(AtomicUsize::new(0));
        let built_inner = Arc::clone(&built);

        struct CountingHandler;

        impl Handler<Echo> for CountingHandler {
            fn handle(
                &self,
                req: Arc<Echo>,
                _signal: CancellationToken,
            ) -> crate::handler::BoxFuture<'static, ChainResult<String>> {
                Box::pin(async move { Ok(req.0.clone()) })
            }
        }

        let registry = Registry::builder()
            .bind_with(move || {
                built_inner.fetch_add(1, Ordering::SeqCst);
                Ok(CountingHandler)
            })
            .build()
            .unwrap();

        let key = CapabilityKey::handler::<Echo>();
        registry.resolve_one(&key).unwrap();
        registry.resolve_one(&key).unwrap();

        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failing_factory_signals_construction() {
        let registry = Registry::builder()
            .bind_with(|| -> std::result::Result<FnHandlerEcho, BoxError> {
                Err("bootstrap failed".into())
            })
            .build()
            .unwrap();

        let failure = registry
            .resolve_one(&CapabilityKey::handler::<Echo>())
            .err()
            .expect("factory failure must surface");
        assert!(matches!(failure, ResolveFailure::Construction(_)));
    }

    // Concrete handler type for the failing-factory test; a closure's
    // anonymous type cannot be named in the factory's return annotation.
    struct FnHandlerEcho;

    impl Handler<Echo> for FnHandlerEcho {
        fn handle(
            &self,
            req: Arc<Echo>,
            _signal: CancellationToken,
        ) -> crate::handler::BoxFuture<'static, ChainResult<String>> {
            Box::pin(async move { Ok(req.0.clone()) })
        }
    }

    #[test]
    fn test_subscribers_tracked_separately() {
        let registry = Registry::builder()
            .subscribe_fn(|_n: Arc<Tick>, _signal| async { Ok(()) })
            .subscribe_fn(|_n: Arc<Tick>, _signal| async { Ok(()) })
            .build()
            .unwrap();

        assert_eq!(registry.subscriber_count::<Tick>(), 2);
        assert!(!registry.has_handler::<Echo>());
    }
}
