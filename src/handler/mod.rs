//! Handler module - the capability traits a chain is built from.
//!
//! Provides:
//! - [`Handler`] - computes the response for one request type
//! - [`Behavior`] - wraps handler execution with cross-cutting logic
//! - [`FnHandler`] / [`FnBehavior`] - adapters for async closures
//!
//! # Example
//!
//! ```ignore
//! use reqwire::{Behavior, BoxFuture, ChainResult, Handler, Next, Request};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Ping;
//!
//! impl Request for Ping {
//!     type Response = String;
//! }
//!
//! struct PingHandler;
//!
//! impl Handler<Ping> for PingHandler {
//!     fn handle(
//!         &self,
//!         _request: std::sync::Arc<Ping>,
//!         _signal: CancellationToken,
//!     ) -> BoxFuture<'static, ChainResult<String>> {
//!         Box::pin(async { Ok("pong".to_string()) })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::ChainResult;
use crate::request::Request;

mod adapters;

pub use adapters::{FnBehavior, FnHandler};

/// Boxed future for handler and behavior results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The rest of the chain, as seen from inside a behavior: either the next
/// behavior or the terminal handler invocation.
///
/// Invoking it runs everything inward of the current link. Dropping it
/// without invoking short-circuits the chain; the behavior's own return
/// value then becomes the final response.
pub type Next<T> = Box<dyn FnOnce() -> BoxFuture<'static, ChainResult<T>> + Send>;

/// The single capability that computes a response for one request type.
///
/// Exactly one handler must be bound per request type at dispatch time.
/// The cancellation signal is the caller's own token, passed through
/// unchanged; handlers that suspend should observe it and abort early.
pub trait Handler<R: Request>: Send + Sync + 'static {
    /// Consume a request and produce its response, or fail.
    fn handle(
        &self,
        request: Arc<R>,
        signal: CancellationToken,
    ) -> BoxFuture<'static, ChainResult<R::Response>>;
}

/// A cross-cutting capability wrapped around handler execution.
///
/// A behavior receives the request, the caller's cancellation signal, and
/// the [`Next`] continuation representing everything inward of it. It may
/// run code before and after invoking `next`, may transform the eventual
/// result or error, or may short-circuit by never invoking `next`.
///
/// Zero or more behaviors may be bound to a request type; registration
/// order is significant - the first-registered behavior runs outermost.
pub trait Behavior<R: Request>: Send + Sync + 'static {
    /// Run this link of the chain.
    fn handle(
        &self,
        request: Arc<R>,
        signal: CancellationToken,
        next: Next<R::Response>,
    ) -> BoxFuture<'static, ChainResult<R::Response>>;
}
