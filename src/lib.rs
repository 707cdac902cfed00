//! # Route Mux
//!
//! A hierarchical HTTP request router built on the `http` crate, with
//! support for:
//!
//! - **Typed Path Patterns** - Literal, `<<variable>>` and terminal `*` wildcard segments
//! - **Nested Routes** - Child routes consume the path where their parent stopped
//! - **Multi-valued Variables** - The same variable bound at several levels keeps every value
//! - **Middleware** - Global, per-route and inherited wrappers, plus always-on pre-middleware
//! - **Named Routes** - Look routes up by `parent:child` names and build URLs in reverse
//! - **Resolvers** - Hand everything past a wildcard to the handler that owns it
//! - **Error Handling** - Distinct not-found and method-not-allowed outcomes with custom handlers
//! - **Hot Swap** - Replace the whole route tree while serving
//!
//! # Quick Start
//!
//! ```
//! use route_mux::{context, Body, Mux};
//! use http::{Request, Response, StatusCode};
//!
//! fn user(req: Request<Body>) -> Response<Body> {
//!     let vars = context::vars(&req).cloned().unwrap_or_default();
//!     Response::new(Body::from(format!("user {}", vars.get("id"))))
//! }
//!
//! let mut mux = Mux::new();
//! mux.get("/", |_req: Request<Body>| Response::new(Body::from_static(b"index")));
//! mux.get("/users/<<id>>", user).name("user");
//!
//! let req = Request::get("/users/7").body(Body::new()).unwrap();
//! let response = mux.dispatch(req);
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(&response.body()[..], b"user 7");
//! ```
//!
//! # Nested Routes
//!
//! Each route declares only its own segments. A child is matched against
//! whatever its parent left over, so the effective pattern of a route is the
//! concatenation of its ancestors' patterns and its own:
//!
//! ```
//! use route_mux::{Body, Mux, Route};
//! use http::{Method, Request, Response};
//!
//! fn page(_req: Request<Body>) -> Response<Body> {
//!     Response::new(Body::new())
//! }
//!
//! let mut mux = Mux::new();
//! mux.add_route(
//!     Route::group("/dashboard")
//!         .name("dashboard")
//!         .children(vec![
//!             Route::new(Method::GET, "/overview", page).name("overview"),
//!             Route::new(Method::GET, "/reports/<<year>>", page).name("reports"),
//!         ]),
//! );
//!
//! assert!(mux.match_route(&Method::GET, "/dashboard/overview").is_matched());
//! assert_eq!(
//!     mux.reverse("dashboard:reports", [2024]).unwrap(),
//!     "/dashboard/reports/2024"
//! );
//! ```
//!
//! # Method Policy
//!
//! Siblings are tried in registration order. A route whose pattern matches
//! but whose method does not ends the search with a method-not-allowed
//! outcome, which the default error handler reports as a 500.
//!
//! # Feature Flags
//!
//! - `log` (default) - Uses the standard `log` crate for logging
//! - `tracing` - Uses the `tracing` crate for structured logging (mutually exclusive with `log`)
//! - `cache` (default) - LRU cache for route name lookups

#![doc(html_root_url = "https://docs.rs/route-mux/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

// Cache (optional)
#[cfg(feature = "cache")]
pub mod cache;

// Pattern grammar and matching
pub mod config;
pub mod matcher;
pub mod pattern;
pub mod reverse;

// Route tree and dispatch
pub mod mux;
pub mod route;

// Error handling
pub mod error;

// Capabilities
pub mod handler;
pub mod middleware;

// Other modules
pub mod context;
pub mod namespace;
pub mod params;
pub mod shared;

// Re-export main types for convenient access
#[cfg(feature = "cache")]
pub use cache::{CacheStats, RouteCache};
pub use config::MuxConfig;
pub use context::RouteInfo;
pub use error::{
    ConfigError, DispatchError, ErrorHandler, ErrorHandlers, NotFoundHandler, PatternError,
    ReverseError,
};
pub use handler::{handler_fn, Body, BoxedHandler, Handler, Resolver};
pub use matcher::{match_tree, MatchOutcome, RouteMatch};
pub use middleware::{middleware_fn, BoxedMiddleware, FnMiddleware, Middleware};
pub use mux::{Mux, RouteMut};
pub use namespace::{Namespace, NamespaceOptions, RouteAddedHook, RouteServeHook};
pub use params::Variables;
pub use pattern::{split_path, MatchStep, Pattern, PatternChain, Segment, SegmentKind};
pub use reverse::reverse_chain;
pub use route::{NodeId, Route, RouteMethod, RouteNode, RouteTree};
pub use shared::SharedMux;
