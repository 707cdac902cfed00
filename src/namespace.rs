//! Registration namespaces
//!
//! A [`Namespace`] wraps a mux during setup and applies the same treatment
//! to every route registered through it: a callback when the route is added,
//! and/or a request rewrite right before the route's handler runs.
//!
//! # Example
//!
//! ```
//! use route_mux::{Body, Mux, Namespace, NamespaceOptions};
//! use http::{HeaderValue, Request, Response};
//!
//! let mut mux = Mux::new();
//! {
//!     let mut admin = Namespace::new(
//!         &mut mux,
//!         NamespaceOptions::new()
//!             .on_route_added(|route| route.name("admin"))
//!             .on_route_serve(|mut req: Request<Body>| {
//!                 req.headers_mut()
//!                     .insert("x-area", HeaderValue::from_static("admin"));
//!                 req
//!             }),
//!     );
//!     admin.get("/admin", |req: Request<Body>| {
//!         let area = req.headers()["x-area"].to_str().unwrap_or_default().to_string();
//!         Response::new(Body::from(area))
//!     });
//! }
//!
//! let req = Request::get("/admin").body(Body::new()).unwrap();
//! assert_eq!(&mux.dispatch(req).body()[..], b"admin");
//! assert!(mux.find("admin").is_some());
//! ```

use crate::error::{ConfigError, PatternError};
use crate::handler::{Body, BoxedHandler, Handler};
use crate::middleware::{middleware_fn, Middleware};
use crate::mux::{registration_verbs, Mux, RouteMut};
use crate::route::{Route, RouteMethod};
use http::Request;
use std::fmt;
use std::sync::Arc;

/// Callback run for every route added through a namespace
pub type RouteAddedHook = Box<dyn Fn(RouteMut<'_>) -> RouteMut<'_> + Send + Sync>;

/// Request rewrite run before the handler of every namespaced route
pub type RouteServeHook = Arc<dyn Fn(Request<Body>) -> Request<Body> + Send + Sync>;

/// Hooks applied by a [`Namespace`]; at least one must be set
#[derive(Default)]
pub struct NamespaceOptions {
    pub on_route_added: Option<RouteAddedHook>,
    pub on_route_serve: Option<RouteServeHook>,
}

impl NamespaceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` on every route registered through the namespace
    pub fn on_route_added<F>(mut self, hook: F) -> Self
    where
        F: Fn(RouteMut<'_>) -> RouteMut<'_> + Send + Sync + 'static,
    {
        self.on_route_added = Some(Box::new(hook));
        self
    }

    /// Rewrite every request before a namespaced handler sees it
    pub fn on_route_serve<F>(mut self, hook: F) -> Self
    where
        F: Fn(Request<Body>) -> Request<Body> + Send + Sync + 'static,
    {
        self.on_route_serve = Some(Arc::new(hook));
        self
    }

    fn is_empty(&self) -> bool {
        self.on_route_added.is_none() && self.on_route_serve.is_none()
    }
}

impl fmt::Debug for NamespaceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceOptions")
            .field("on_route_added", &self.on_route_added.is_some())
            .field("on_route_serve", &self.on_route_serve.is_some())
            .finish()
    }
}

/// A mux wrapper applying hooks to every route registered through it
pub struct Namespace<'m> {
    mux: &'m mut Mux,
    options: NamespaceOptions,
}

impl<'m> Namespace<'m> {
    /// Wrap `mux`
    ///
    /// # Panics
    ///
    /// Panics if neither hook is set. Use `try_new` for a non-panicking
    /// version.
    pub fn new(mux: &'m mut Mux, options: NamespaceOptions) -> Self {
        match Self::try_new(mux, options) {
            Ok(namespace) => namespace,
            Err(err) => panic!("Invalid namespace: {}", err),
        }
    }

    /// Wrap `mux`, returning an error if neither hook is set
    pub fn try_new(mux: &'m mut Mux, options: NamespaceOptions) -> Result<Self, ConfigError> {
        if options.is_empty() {
            return Err(ConfigError::NamespaceWithoutHooks);
        }
        Ok(Self { mux, options })
    }

    /// Add global middleware to the wrapped mux
    pub fn use_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.mux.use_middleware(middleware);
        self
    }

    /// Register a root route and apply the namespace hooks to it
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid.
    pub fn handle<H: Handler>(
        &mut self,
        method: impl Into<RouteMethod>,
        pattern: &str,
        handler: H,
    ) -> RouteMut<'_> {
        self.add_route(Route::new(method, pattern, handler))
    }

    /// Register a root route, returning an error for invalid patterns
    pub fn try_handle<H: Handler>(
        &mut self,
        method: impl Into<RouteMethod>,
        pattern: &str,
        handler: H,
    ) -> Result<RouteMut<'_>, PatternError> {
        self.try_add_route(Route::new(method, pattern, handler))
    }

    registration_verbs!();

    /// Graft a built subtree and apply the namespace hooks to its root
    ///
    /// # Panics
    ///
    /// Panics if any pattern in the subtree is invalid.
    pub fn add_route(&mut self, route: Route) -> RouteMut<'_> {
        match self.try_add_route(route) {
            Ok(route) => route,
            Err(err) => panic!("Invalid route pattern: {}", err),
        }
    }

    /// Graft a built subtree and apply the namespace hooks to its root
    pub fn try_add_route(&mut self, route: Route) -> Result<RouteMut<'_>, PatternError> {
        let route = self.mux.try_add_route(route)?;
        Ok(apply_hooks(route, &self.options))
    }

    /// Give back the wrapped mux
    pub fn into_inner(self) -> &'m mut Mux {
        self.mux
    }
}

fn apply_hooks<'r>(mut route: RouteMut<'r>, options: &NamespaceOptions) -> RouteMut<'r> {
    if let Some(hook) = &options.on_route_added {
        route = hook(route);
    }
    if let Some(rewrite) = &options.on_route_serve {
        let rewrite = Arc::clone(rewrite);
        route = route.middleware(middleware_fn(move |next: BoxedHandler| -> BoxedHandler {
            let rewrite = rewrite.clone();
            Arc::new(move |req: Request<Body>| next.serve(rewrite(req)))
        }));
    }
    route
}

impl fmt::Debug for Namespace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("options", &self.options)
            .finish()
    }
}
