//! # reqwire
//!
//! In-process request dispatch with composable behavior pipelines.
//!
//! Given a request value, reqwire locates the single handler responsible
//! for producing that request's response and runs the call through an
//! ordered chain of cross-cutting behaviors (logging, validation,
//! transactions) - without the caller or the handler knowing the chain
//! exists.
//!
//! ## Architecture
//!
//! - **Request**: a value typed with exactly one response type
//! - **Handler**: the single capability computing that response
//! - **Behavior**: cross-cutting logic wrapped around the handler;
//!   first-registered runs outermost
//! - **Registry**: typed lookup table binding request types to handler and
//!   behavior factories, built at startup
//! - **Dispatcher**: resolves, composes a fresh chain per call, executes
//!
//! Dispatch is synchronous-per-call and in-memory: no queueing, no
//! retries, no timers. A cancellation token is threaded unchanged to every
//! link; observing it is each link's job.
//!
//! ## Example
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
//!         .behavior_fn(|req: Arc<GetUser>, _signal, next| async move {
//!             tracing::info!("loading user {}", req.id);
//!             next().await
//!         })
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

pub mod chain;
pub mod error;
pub mod handler;
pub mod notify;
pub mod registry;
pub mod resolver;

mod dispatcher;
mod request;

pub use dispatcher::Dispatcher;
pub use error::{BoxError, ChainResult, DispatchError};
pub use handler::{Behavior, BoxFuture, FnBehavior, FnHandler, Handler, Next};
pub use notify::{FnSubscriber, Notification, Subscriber};
pub use registry::{Registry, RegistryBuilder};
pub use request::Request;
pub use resolver::Resolver;

// The signal type threaded through every chain link, re-exported so
// callers need no direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
