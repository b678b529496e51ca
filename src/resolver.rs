//! Resolver boundary - where capability instances come from.
//!
//! The dispatch core never constructs handlers, behaviors, or subscribers
//! itself; it asks a [`Resolver`] for them, once per call. The stock
//! implementation is [`Registry`](crate::registry::Registry), but anything
//! that can produce instances for a [`CapabilityKey`] (a DI container, a
//! test double) can stand in.
//!
//! Instances cross the boundary as erased [`InstanceSlot`] cells built
//! with [`handler_slot`], [`behavior_slot`], or [`subscriber_slot`]; the
//! dispatcher downcasts them back to the typed capability. A slot built
//! for the wrong capability is detected at dispatch and reported as a
//! mismatch, never silently treated as absent.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::error::{BoxError, DispatchError};
use crate::handler::{Behavior, Handler};
use crate::notify::{Notification, Subscriber};
use crate::request::Request;

/// Which capability a [`CapabilityKey`] asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    /// The single handler bound to a request type.
    Handler,
    /// The ordered behaviors bound to a request type.
    Behavior,
    /// The ordered subscribers bound to a notification type.
    Subscriber,
}

/// Typed descriptor of a capability lookup.
///
/// Pairs the message's `TypeId` with the capability kind, plus the type
/// name for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityKey {
    kind: CapabilityKind,
    message: TypeId,
    message_type: &'static str,
}

impl CapabilityKey {
    /// Key for the handler bound to request type `R`.
    pub fn handler<R: Request>() -> Self {
        Self {
            kind: CapabilityKind::Handler,
            message: TypeId::of::<R>(),
            message_type: std::any::type_name::<R>(),
        }
    }

    /// Key for the behaviors bound to request type `R`.
    pub fn behaviors<R: Request>() -> Self {
        Self {
            kind: CapabilityKind::Behavior,
            message: TypeId::of::<R>(),
            message_type: std::any::type_name::<R>(),
        }
    }

    /// Key for the subscribers bound to notification type `N`.
    pub fn subscribers<N: Notification>() -> Self {
        Self {
            kind: CapabilityKind::Subscriber,
            message: TypeId::of::<N>(),
            message_type: std::any::type_name::<N>(),
        }
    }

    /// The capability kind this key asks for.
    #[inline]
    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// `TypeId` of the request or notification type.
    #[inline]
    pub fn message(&self) -> TypeId {
        self.message
    }

    /// Name of the request or notification type, for diagnostics.
    #[inline]
    pub fn message_type(&self) -> &'static str {
        self.message_type
    }
}

/// Erased capability instance handed across the resolver boundary.
pub type InstanceSlot = Arc<dyn Any + Send + Sync>;

/// Explicit failure a resolver may signal instead of an instance.
#[derive(Debug)]
pub enum ResolveFailure {
    /// Constructing the instance failed; carries the original cause.
    Construction(BoxError),
    /// More than one instance is bound where exactly one is required.
    Ambiguous {
        /// How many instances the resolver found.
        bindings: usize,
    },
}

impl ResolveFailure {
    pub(crate) fn into_dispatch(self, request_type: &'static str) -> DispatchError {
        match self {
            Self::Construction(source) => DispatchError::HandlerConstruction {
                request_type,
                source,
            },
            Self::Ambiguous { bindings } => DispatchError::AmbiguousBinding {
                request_type,
                bindings,
            },
        }
    }
}

/// External capability-instance provider consumed by the dispatcher.
///
/// Instance construction and scoping belong to the implementor; the core
/// resolves once per dispatch and never caches across calls.
pub trait Resolver: Send + Sync + 'static {
    /// Return exactly one instance for the capability, absence, or an
    /// explicit failure.
    fn resolve_one(&self, key: &CapabilityKey) -> std::result::Result<Option<InstanceSlot>, ResolveFailure>;

    /// Return all instances for the capability, in the order they were
    /// registered (outermost first for behaviors). An empty sequence is
    /// valid.
    fn resolve_all(&self, key: &CapabilityKey) -> std::result::Result<Vec<InstanceSlot>, ResolveFailure>;
}

struct HandlerSlot<R: Request>(Arc<dyn Handler<R>>);
struct BehaviorSlot<R: Request>(Arc<dyn Behavior<R>>);
struct SubscriberSlot<N: Notification>(Arc<dyn Subscriber<N>>);

/// Wrap a handler for request type `R` into an erased slot.
pub fn handler_slot<R: Request>(handler: Arc<dyn Handler<R>>) -> InstanceSlot {
    Arc::new(HandlerSlot(handler))
}

/// Wrap a behavior for request type `R` into an erased slot.
pub fn behavior_slot<R: Request>(behavior: Arc<dyn Behavior<R>>) -> InstanceSlot {
    Arc::new(BehaviorSlot(behavior))
}

/// Wrap a subscriber for notification type `N` into an erased slot.
pub fn subscriber_slot<N: Notification>(subscriber: Arc<dyn Subscriber<N>>) -> InstanceSlot {
    Arc::new(SubscriberSlot(subscriber))
}

pub(crate) fn downcast_handler<R: Request>(slot: &InstanceSlot) -> Option<Arc<dyn Handler<R>>> {
    slot.downcast_ref::<HandlerSlot<R>>()
        .map(|slot| Arc::clone(&slot.0))
}

pub(crate) fn downcast_behavior<R: Request>(slot: &InstanceSlot) -> Option<Arc<dyn Behavior<R>>> {
    slot.downcast_ref::<BehaviorSlot<R>>()
        .map(|slot| Arc::clone(&slot.0))
}

pub(crate) fn downcast_subscriber<N: Notification>(
    slot: &InstanceSlot,
) -> Option<Arc<dyn Subscriber<N>>> {
    slot.downcast_ref::<SubscriberSlot<N>>()
        .map(|slot| Arc::clone(&slot.0))
}
