//! Request contract.

/// A dispatchable request.
///
/// Each concrete request type is statically associated with exactly one
/// response type, and may be bound to at most one handler across the
/// process. Requests are plain values; the dispatcher shares one instance
/// with every link of the chain, so they are never mutated in flight.
///
/// # Example
///
/// ```
/// use reqwire::Request;
///
/// struct GetUser {
///     id: u64,
/// }
///
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// impl Request for GetUser {
///     type Response = User;
/// }
/// ```
pub trait Request: Send + Sync + 'static {
    /// The response this request resolves to.
    type Response: Send + 'static;
}
