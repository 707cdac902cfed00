//! Request-scoped routing data
//!
//! Before a matched handler runs, the dispatcher stores the captured
//! [`Variables`] and a [`RouteInfo`] describing the matched route in the
//! request's extensions. Handlers and middleware read them back with
//! [`vars`] and [`route_info`].
//!
//! # Example
//!
//! ```
//! use route_mux::{context, Body, Mux};
//! use http::{Request, Response};
//!
//! let mut mux = Mux::new();
//! mux.get("/users/<<id>>", |req: Request<Body>| {
//!     let id = context::vars(&req).map(|vars| vars.get("id").to_string());
//!     Response::new(Body::from(id.unwrap_or_default()))
//! });
//!
//! let req = Request::get("/users/42").body(Body::new()).unwrap();
//! assert_eq!(&mux.dispatch(req).body()[..], b"42");
//! ```

use crate::params::Variables;
use crate::route::NodeId;
use http::Request;

/// Description of the route a request was dispatched to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// Node the request matched
    pub id: NodeId,
    /// Name of the node, empty if unnamed
    pub name: String,
    /// Full rendered pattern including ancestors
    pub pattern: String,
}

/// Variables captured for this request
pub fn vars<B>(req: &Request<B>) -> Option<&Variables> {
    req.extensions().get::<Variables>()
}

/// Route this request was dispatched to
pub fn route_info<B>(req: &Request<B>) -> Option<&RouteInfo> {
    req.extensions().get::<RouteInfo>()
}

/// Replace the variables attached to a request
pub fn set_vars<B>(req: &mut Request<B>, vars: Variables) {
    req.extensions_mut().insert(vars);
}

pub(crate) fn attach<B>(req: &mut Request<B>, vars: Variables, info: RouteInfo) {
    let extensions = req.extensions_mut();
    extensions.insert(vars);
    extensions.insert(info);
}
