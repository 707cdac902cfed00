//! Route middleware trait and types
//!
//! Middleware wraps a handler in another handler, which lets it run code
//! before and after the wrapped handler, rewrite the request, or answer on
//! its own. Logging, compression and authentication all live at this layer;
//! the router only decides the order in which middleware is applied.
//!
//! # Example
//!
//! ```
//! use route_mux::{Body, BoxedHandler, Handler, Middleware};
//! use http::{HeaderValue, Request};
//! use std::sync::Arc;
//!
//! struct PoweredBy;
//!
//! impl Middleware for PoweredBy {
//!     fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
//!         Arc::new(move |req: Request<Body>| {
//!             let mut response = next.serve(req);
//!             response
//!                 .headers_mut()
//!                 .insert("x-powered-by", HeaderValue::from_static("route-mux"));
//!             response
//!         })
//!     }
//!
//!     fn name(&self) -> &str {
//!         "PoweredBy"
//!     }
//! }
//! ```

use crate::handler::BoxedHandler;
use std::sync::Arc;

/// Transforms a handler into a handler.
///
/// Implement it on a type, or build one from a closure with
/// [`middleware_fn`].
pub trait Middleware: Send + Sync + 'static {
    /// Wrap `next`, returning the handler that runs in its place
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;

    /// Middleware name for debugging
    fn name(&self) -> &str {
        "Middleware"
    }
}

/// Helper to create middleware from a closure
///
/// # Example
///
/// ```
/// use route_mux::{middleware_fn, Body, BoxedHandler, Handler, Middleware};
/// use http::Request;
/// use std::sync::Arc;
///
/// let passthrough = middleware_fn(|next: BoxedHandler| -> BoxedHandler {
///     Arc::new(move |req: Request<Body>| next.serve(req))
/// });
/// assert_eq!(passthrough.name(), "Middleware");
/// ```
pub fn middleware_fn<F>(f: F) -> FnMiddleware<F>
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    FnMiddleware { f }
}

/// Middleware created from a closure
pub struct FnMiddleware<F> {
    f: F,
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        (self.f)(next)
    }
}

/// Type-erased middleware for dynamic dispatch
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Wrap `handler` with `middleware`, the first entry ending up outermost
pub fn apply<'a, I>(handler: BoxedHandler, middleware: I) -> BoxedHandler
where
    I: IntoIterator<Item = &'a BoxedMiddleware>,
    I::IntoIter: DoubleEndedIterator,
{
    middleware
        .into_iter()
        .rev()
        .fold(handler, |next, middleware| middleware.wrap(next))
}
