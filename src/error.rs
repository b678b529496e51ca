//! Error types for reqwire.

use thiserror::Error;

/// Erased error type produced by handlers, behaviors, and factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a single chain link (a behavior or the terminal handler).
///
/// Links exchange plain [`BoxError`] values, so a behavior can inspect,
/// downcast, or replace an inner error before it reaches the caller.
pub type ChainResult<T> = std::result::Result<T, BoxError>;

/// Main error type for dispatch operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The resolver failed while constructing the handler (or a behavior)
    /// for the request type. The original cause is available via
    /// [`std::error::Error::source`].
    #[error("error constructing handler for request type `{request_type}`")]
    HandlerConstruction {
        /// Name of the request type being dispatched.
        request_type: &'static str,
        /// The failure raised by the resolver.
        #[source]
        source: BoxError,
    },

    /// No handler is registered for the request type. A configuration gap,
    /// not a runtime fault: bind a handler before dispatching.
    #[error("no handler registered for request type `{request_type}`")]
    HandlerNotRegistered {
        /// Name of the request type being dispatched.
        request_type: &'static str,
    },

    /// More than one handler is bound to the request type.
    #[error("{bindings} handlers bound for request type `{request_type}`, expected exactly one")]
    AmbiguousBinding {
        /// Name of the request type.
        request_type: &'static str,
        /// How many handlers the resolver reported.
        bindings: usize,
    },

    /// The resolver returned an instance that is not the capability the
    /// key asked for (wrong-typed slot).
    #[error("resolved instance is not a valid capability for request type `{request_type}`")]
    CapabilityMismatch {
        /// Name of the request type.
        request_type: &'static str,
    },

    /// An error raised inside the composed chain (handler or behavior
    /// logic), passed through unmodified.
    #[error(transparent)]
    Chain(BoxError),
}

impl DispatchError {
    /// True if the error is a missing handler binding.
    #[inline]
    pub fn is_not_registered(&self) -> bool {
        matches!(self, Self::HandlerNotRegistered { .. })
    }

    /// True if the error is an ambiguous handler binding.
    #[inline]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::AmbiguousBinding { .. })
    }

    /// True if the error was raised while constructing a capability.
    #[inline]
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::HandlerConstruction { .. })
    }

    /// True if the error came from inside the chain.
    #[inline]
    pub fn is_chain(&self) -> bool {
        matches!(self, Self::Chain(_))
    }

    /// Recover the unmodified chain error, if this is one.
    pub fn into_chain_error(self) -> Option<BoxError> {
        match self {
            Self::Chain(err) => Some(err),
            _ => None,
        }
    }

    /// Name of the request type the failure refers to, if the error
    /// originated in resolution.
    pub fn request_type(&self) -> Option<&'static str> {
        match self {
            Self::HandlerConstruction { request_type, .. }
            | Self::HandlerNotRegistered { request_type }
            | Self::AmbiguousBinding { request_type, .. }
            | Self::CapabilityMismatch { request_type } => Some(request_type),
            Self::Chain(_) => None,
        }
    }
}

/// Result type alias using DispatchError.
pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("database unavailable")]
    struct DbDown;

    #[test]
    fn test_construction_error_keeps_cause() {
        let err = DispatchError::HandlerConstruction {
            request_type: "GetUser",
            source: Box::new(DbDown),
        };

        assert!(err.is_construction());
        assert_eq!(err.request_type(), Some("GetUser"));

        let source = std::error::Error::source(&err).expect("source must be retained");
        assert!(source.downcast_ref::<DbDown>().is_some());
    }

    #[test]
    fn test_chain_error_is_transparent() {
        let err = DispatchError::Chain(Box::new(DbDown));

        // Display must be the inner error's, untouched.
        assert_eq!(err.to_string(), "database unavailable");
        assert!(err.is_chain());
        assert_eq!(err.request_type(), None);

        let inner = err.into_chain_error().expect("chain error must unwrap");
        assert!(inner.downcast_ref::<DbDown>().is_some());
    }

    #[test]
    fn test_not_registered_names_type() {
        let err = DispatchError::HandlerNotRegistered {
            request_type: "GetUser",
        };
        assert!(err.is_not_registered());
        assert!(err.to_string().contains("GetUser"));
    }

    #[test]
    fn test_ambiguous_reports_count() {
        let err = DispatchError::AmbiguousBinding {
            request_type: "GetUser",
            bindings: 2,
        };
        assert!(err.is_ambiguous());
        assert!(err.to_string().contains('2'));
        assert!(err.to_string().contains("GetUser"));
    }
}
