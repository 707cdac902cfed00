//! The top-level request dispatcher
//!
//! A [`Mux`] owns a route tree, the global middleware list and the
//! not-found/error policy. Routes are registered through `&mut self`
//! methods that hand back a [`RouteMut`], a short-lived handle used to name
//! the route, attach middleware or register children below it:
//!
//! ```
//! use route_mux::{context, Body, Mux};
//! use http::{Request, Response, StatusCode};
//!
//! fn hello(req: Request<Body>) -> Response<Body> {
//!     let name = context::vars(&req).map(|v| v.get("name").to_string());
//!     Response::new(Body::from(format!("hello {}", name.unwrap_or_default())))
//! }
//!
//! let mut mux = Mux::new();
//! let mut users = mux.group("/users").name("users");
//! users.get("/<<name>>", hello).name("detail");
//!
//! let req = Request::get("/users/ann").body(Body::new()).unwrap();
//! assert_eq!(&mux.dispatch(req).body()[..], b"hello ann");
//!
//! let req = Request::get("/nope").body(Body::new()).unwrap();
//! assert_eq!(mux.dispatch(req).status(), StatusCode::NOT_FOUND);
//!
//! assert_eq!(mux.reverse("users:detail", ["bob"]).unwrap(), "/users/bob");
//! ```
//!
//! Dispatch only needs `&self`, so a fully configured `Mux` can be shared
//! across threads behind an `Arc`. To change routes while serving, see
//! [`SharedMux`](crate::SharedMux).

#[cfg(feature = "cache")]
use crate::cache::{CacheStats, RouteCache};
use crate::config::MuxConfig;
use crate::context::{self, RouteInfo};
use crate::error::{ConfigError, DispatchError, ErrorHandlers, PatternError, ReverseError};
use crate::handler::{Body, BoxedHandler, Handler};
use crate::matcher::{match_tree, MatchOutcome, RouteMatch};
use crate::middleware::{self, BoxedMiddleware, Middleware};
use crate::pattern::split_path;
use crate::route::{NodeId, Route, RouteMethod, RouteNode, RouteTree};
use crate::{debug_log, trace_log, warn_log};
use http::{Request, Response};
use std::borrow::Cow;
use std::fmt;
#[cfg(feature = "cache")]
use std::sync::Mutex;
use std::sync::Arc;

/// Per-verb registration shortcuts for any type with a matching `handle`
macro_rules! registration_verbs {
    () => {
        /// Register a `GET` route
        pub fn get<H: $crate::Handler>(&mut self, pattern: &str, handler: H) -> $crate::RouteMut<'_> {
            self.handle(::http::Method::GET, pattern, handler)
        }

        /// Register a `POST` route
        pub fn post<H: $crate::Handler>(&mut self, pattern: &str, handler: H) -> $crate::RouteMut<'_> {
            self.handle(::http::Method::POST, pattern, handler)
        }

        /// Register a `PUT` route
        pub fn put<H: $crate::Handler>(&mut self, pattern: &str, handler: H) -> $crate::RouteMut<'_> {
            self.handle(::http::Method::PUT, pattern, handler)
        }

        /// Register a `DELETE` route
        pub fn delete<H: $crate::Handler>(&mut self, pattern: &str, handler: H) -> $crate::RouteMut<'_> {
            self.handle(::http::Method::DELETE, pattern, handler)
        }

        /// Register a `HEAD` route
        pub fn head<H: $crate::Handler>(&mut self, pattern: &str, handler: H) -> $crate::RouteMut<'_> {
            self.handle(::http::Method::HEAD, pattern, handler)
        }

        /// Register a `PATCH` route
        pub fn patch<H: $crate::Handler>(&mut self, pattern: &str, handler: H) -> $crate::RouteMut<'_> {
            self.handle(::http::Method::PATCH, pattern, handler)
        }

        /// Register an `OPTIONS` route
        pub fn options<H: $crate::Handler>(&mut self, pattern: &str, handler: H) -> $crate::RouteMut<'_> {
            self.handle(::http::Method::OPTIONS, pattern, handler)
        }

        /// Register a route accepting every method
        pub fn any<H: $crate::Handler>(&mut self, pattern: &str, handler: H) -> $crate::RouteMut<'_> {
            self.handle($crate::RouteMethod::Any, pattern, handler)
        }
    };
}

pub(crate) use registration_verbs;

// ============================================================================
// Mux
// ============================================================================

/// Hierarchical request router
pub struct Mux {
    config: MuxConfig,
    tree: RouteTree,
    middleware: Vec<BoxedMiddleware>,
    handlers: ErrorHandlers,
    #[cfg(feature = "cache")]
    cache: Mutex<RouteCache>,
}

impl Mux {
    /// Create a mux with the default pattern grammar
    pub fn new() -> Self {
        Self::from_valid_config(MuxConfig::default())
    }

    /// Create a mux with a custom pattern grammar
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid. Use `try_with_config` for a
    /// non-panicking version.
    pub fn with_config(config: MuxConfig) -> Self {
        Self::try_with_config(config)
            .unwrap_or_else(|err| panic!("Invalid mux configuration: {}", err))
    }

    /// Create a mux with a custom pattern grammar, validating it first
    pub fn try_with_config(config: MuxConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: MuxConfig) -> Self {
        Self {
            config,
            tree: RouteTree::new(),
            middleware: Vec::new(),
            handlers: ErrorHandlers::default(),
            #[cfg(feature = "cache")]
            cache: Mutex::new(RouteCache::new()),
        }
    }

    pub fn config(&self) -> &MuxConfig {
        &self.config
    }

    /// The route tree
    pub fn tree(&self) -> &RouteTree {
        &self.tree
    }

    // ========================================================================
    // Error policy
    // ========================================================================

    pub fn error_handlers(&self) -> &ErrorHandlers {
        &self.handlers
    }

    /// Replace the not-found and error handlers
    pub fn set_error_handlers(&mut self, handlers: ErrorHandlers) -> &mut Self {
        self.handlers = handlers;
        self
    }

    /// Set the handler for requests no route matches
    pub fn not_found_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Request<Body>) -> Response<Body> + Send + Sync + 'static,
    {
        self.handlers.not_found = Some(Arc::new(handler));
        self
    }

    /// Set the handler for dispatch errors
    pub fn error_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Request<Body>, &DispatchError) -> Response<Body> + Send + Sync + 'static,
    {
        self.handlers.error = Some(Arc::new(handler));
        self
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Add middleware applied to every route that doesn't disable it
    pub fn use_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Global middleware, outermost first
    pub fn middleware(&self) -> &[BoxedMiddleware] {
        &self.middleware
    }

    /// Register a root route
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid. Use `try_handle` for a non-panicking
    /// version.
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

    /// Register a handler-less root that only groups its children
    pub fn group(&mut self, pattern: &str) -> RouteMut<'_> {
        self.add_route(Route::group(pattern))
    }

    /// Graft a built subtree as a new root
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

    /// Graft a built subtree as a new root; nothing is added on error
    pub fn try_add_route(&mut self, route: Route) -> Result<RouteMut<'_>, PatternError> {
        let id = self.register(None, route)?;
        Ok(RouteMut { mux: self, id })
    }

    fn register(&mut self, parent: Option<NodeId>, route: Route) -> Result<NodeId, PatternError> {
        let id = self.tree.add_route(parent, route, &self.config)?;
        self.invalidate();
        debug_log!(
            "Registered route {} at '{}'",
            id,
            self.tree.chain(id).render(&self.config)
        );
        Ok(id)
    }

    /// Remove the route whose full pattern equals `path`, with its subtree
    pub fn remove_by_path(&mut self, path: &str) -> bool {
        let Some(id) = self.tree.find_by_path(path, &self.config) else {
            warn_log!("No route registered at '{}', nothing removed", path);
            return false;
        };
        let removed = self.tree.remove(id);
        self.invalidate();
        debug_log!("Removed route {} at '{}'", id, path);
        removed
    }

    /// Edit an existing route by id
    pub fn route_mut(&mut self, id: NodeId) -> Option<RouteMut<'_>> {
        if self.tree.contains(id) {
            Some(RouteMut { mux: self, id })
        } else {
            None
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn node(&self, id: NodeId) -> Option<&RouteNode> {
        self.tree.get(id)
    }

    /// Full rendered pattern of a route, ancestors included
    pub fn full_pattern(&self, id: NodeId) -> Option<String> {
        self.tree
            .contains(id)
            .then(|| self.tree.chain(id).render(&self.config))
    }

    /// Find a route by its colon-separated name path, e.g. `users:detail`
    pub fn find(&self, name: &str) -> Option<&RouteNode> {
        self.find_id(name).and_then(|id| self.tree.get(id))
    }

    /// Build the concrete path of a named route
    ///
    /// # Example
    ///
    /// ```
    /// use route_mux::{Body, Mux, ReverseError};
    /// use http::{Request, Response};
    ///
    /// let mut mux = Mux::new();
    /// mux.get("/a/<<b>>", |_req: Request<Body>| Response::new(Body::new()))
    ///     .name("a");
    ///
    /// assert_eq!(mux.reverse("a", ["x"]).unwrap(), "/a/x");
    /// assert_eq!(
    ///     mux.reverse("a", Vec::<String>::new()),
    ///     Err(ReverseError::NotEnoughVariables)
    /// );
    /// ```
    pub fn reverse<I>(&self, name: &str, values: I) -> Result<String, ReverseError>
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let id = self.find_id(name).ok_or_else(|| ReverseError::RouteNotFound {
            name: name.to_string(),
        })?;
        let values: Vec<String> = values.into_iter().map(|value| value.to_string()).collect();
        self.tree.chain(id).reverse(&values, &self.config)
    }

    #[cfg(feature = "cache")]
    fn find_id(&self, name: &str) -> Option<NodeId> {
        if name.is_empty() {
            return None;
        }
        // A poisoned lock only costs the memoisation
        let Ok(mut cache) = self.cache.lock() else {
            return self.tree.find_by_name(name);
        };
        if let Some(id) = cache.get(name) {
            return Some(id);
        }
        let id = self.tree.find_by_name(name)?;
        cache.insert(name, id);
        Some(id)
    }

    #[cfg(not(feature = "cache"))]
    fn find_id(&self, name: &str) -> Option<NodeId> {
        if name.is_empty() {
            return None;
        }
        self.tree.find_by_name(name)
    }

    #[cfg(feature = "cache")]
    fn invalidate(&mut self) {
        match self.cache.get_mut() {
            Ok(cache) => cache.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    #[cfg(not(feature = "cache"))]
    fn invalidate(&mut self) {}

    /// Name cache statistics
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.lock().ok().map(|cache| cache.stats().clone())
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Split a request path into pieces, percent-decoding them if configured
    pub fn split<'p>(&self, path: &'p str) -> Vec<Cow<'p, str>> {
        split_path(path, &self.config.delimiter)
            .into_iter()
            .map(|piece| {
                if self.config.percent_decode {
                    urlencoding::decode(piece).unwrap_or(Cow::Borrowed(piece))
                } else {
                    Cow::Borrowed(piece)
                }
            })
            .collect()
    }

    /// Decide which route a method and path would be dispatched to
    pub fn match_route(&self, method: &http::Method, path: &str) -> MatchOutcome {
        let pieces = self.split(path);
        let pieces: Vec<&str> = pieces.iter().map(|piece| &**piece).collect();
        match_tree(&self.tree, method, &pieces)
    }

    /// Route a request and produce its response
    pub fn dispatch(&self, mut req: Request<Body>) -> Response<Body> {
        let path = req.uri().path().to_string();

        match self.match_route(req.method(), &path) {
            MatchOutcome::Matched(RouteMatch { node, variables }) => {
                let Some(handler) = self.effective_handler(node) else {
                    return self.handlers.not_found(req);
                };
                trace_log!("Dispatching {} {} to route {}", req.method(), path, node);
                context::attach(&mut req, variables, self.route_info(node));
                handler.serve(req)
            }
            MatchOutcome::MethodNotAllowed { node } => {
                warn_log!(
                    "{} {} matched route {} but its method does not",
                    req.method(),
                    path,
                    node
                );
                let error = DispatchError::MethodNotAllowed {
                    method: req.method().to_string(),
                    path,
                };
                self.handlers.error(req, &error)
            }
            MatchOutcome::NotFound => {
                debug_log!("No route for {} {}", req.method(), path);
                self.handlers.not_found(req)
            }
        }
    }

    /// Handler of a node wrapped in its middleware, outermost first:
    /// pre-middleware, global, ancestors (root first), the node's own
    fn effective_handler(&self, id: NodeId) -> Option<BoxedHandler> {
        let node = self.tree.get(id)?;
        let handler = node.handler()?.clone();

        let mut layers: Vec<&BoxedMiddleware> = node.pre_middleware().iter().collect();
        if !node.is_middleware_disabled() {
            layers.extend(&self.middleware);
            for ancestor in self.tree.ancestors(id) {
                if let Some(ancestor) = self.tree.get(ancestor) {
                    layers.extend(ancestor.middleware());
                }
            }
            layers.extend(node.middleware());
        }

        Some(middleware::apply(handler, layers))
    }

    fn route_info(&self, id: NodeId) -> RouteInfo {
        RouteInfo {
            id,
            name: self.tree.get(id).map(|node| node.name().to_string()).unwrap_or_default(),
            pattern: self.tree.chain(id).render(&self.config),
        }
    }
}

impl Handler for Mux {
    fn serve(&self, req: Request<Body>) -> Response<Body> {
        self.dispatch(req)
    }
}

impl Default for Mux {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Mux {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            tree: self.tree.clone(),
            middleware: self.middleware.clone(),
            handlers: self.handlers.clone(),
            #[cfg(feature = "cache")]
            cache: Mutex::new(RouteCache::new()),
        }
    }
}

impl fmt::Debug for Mux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mux")
            .field("config", &self.config)
            .field("tree", &self.tree)
            .field("middleware_count", &self.middleware.len())
            .field("handlers", &self.handlers)
            .finish()
    }
}

// ============================================================================
// RouteMut
// ============================================================================

/// Registration handle for one route of a [`Mux`]
///
/// Builder methods (`name`, `middleware`, ...) consume and return the
/// handle; child registration borrows it, so several children can be
/// registered below the same parent.
pub struct RouteMut<'m> {
    mux: &'m mut Mux,
    id: NodeId,
}

impl<'m> RouteMut<'m> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> Option<&RouteNode> {
        self.mux.tree.get(self.id)
    }

    /// Full rendered pattern, ancestors included
    pub fn full_pattern(&self) -> String {
        self.mux.tree.chain(self.id).render(&self.mux.config)
    }

    fn edit(self, f: impl FnOnce(&mut RouteNode)) -> Self {
        if let Some(node) = self.mux.tree.get_mut(self.id) {
            f(node);
        }
        self.mux.invalidate();
        self
    }

    /// Set the route name used by `find` and `reverse`
    pub fn name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.edit(|node| node.set_name(name))
    }

    /// Add middleware to this route; it also wraps every descendant
    pub fn middleware<M: Middleware>(self, middleware: M) -> Self {
        self.edit(|node| node.push_middleware(Arc::new(middleware)))
    }

    /// Add middleware that always runs outermost for this route
    pub fn pre_middleware<M: Middleware>(self, middleware: M) -> Self {
        self.edit(|node| node.push_pre_middleware(Arc::new(middleware)))
    }

    /// Skip global, ancestor and own middleware when serving this route
    pub fn disable_middleware(self) -> Self {
        self.edit(RouteNode::disable_middleware)
    }

    /// Register a child route
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid or this route ends in a wildcard.
    pub fn handle<H: Handler>(
        &mut self,
        method: impl Into<RouteMethod>,
        pattern: &str,
        handler: H,
    ) -> RouteMut<'_> {
        self.add_route(Route::new(method, pattern, handler))
    }

    /// Register a child route, returning an error instead of panicking
    pub fn try_handle<H: Handler>(
        &mut self,
        method: impl Into<RouteMethod>,
        pattern: &str,
        handler: H,
    ) -> Result<RouteMut<'_>, PatternError> {
        self.try_add_route(Route::new(method, pattern, handler))
    }

    registration_verbs!();

    /// Register a handler-less child that only groups its own children
    pub fn group(&mut self, pattern: &str) -> RouteMut<'_> {
        self.add_route(Route::group(pattern))
    }

    /// Graft a built subtree below this route
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

    /// Graft a built subtree below this route; nothing is added on error
    pub fn try_add_route(&mut self, route: Route) -> Result<RouteMut<'_>, PatternError> {
        let id = self.mux.register(Some(self.id), route)?;
        Ok(RouteMut {
            mux: &mut *self.mux,
            id,
        })
    }
}

impl fmt::Debug for RouteMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMut")
            .field("id", &self.id)
            .field("pattern", &self.full_pattern())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::middleware_fn;
    use http::{HeaderValue, Method, StatusCode};
    use std::sync::Mutex as StdMutex;

    fn text(body: &'static str) -> impl Fn(Request<Body>) -> Response<Body> + Send + Sync + 'static {
        move |_req| Response::new(Body::from_static(body.as_bytes()))
    }

    fn request(method: Method, path: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Body::new())
            .unwrap()
    }

    fn body(response: &Response<Body>) -> String {
        String::from_utf8(response.body().to_vec()).unwrap()
    }

    fn tag(label: &'static str, log: Arc<StdMutex<Vec<&'static str>>>) -> impl Middleware {
        middleware_fn(move |next: BoxedHandler| -> BoxedHandler {
            let log = log.clone();
            Arc::new(move |req: Request<Body>| {
                log.lock().unwrap().push(label);
                next.serve(req)
            })
        })
    }

    #[test]
    fn test_dispatch_basic() {
        let mut mux = Mux::new();
        mux.get("/", text("index"));
        mux.get("/hello", text("hello"));

        assert_eq!(body(&mux.dispatch(request(Method::GET, "/"))), "index");
        assert_eq!(body(&mux.dispatch(request(Method::GET, "/hello/"))), "hello");
    }

    #[test]
    fn test_method_not_allowed_vs_not_found() {
        let mut mux = Mux::new();
        mux.get("/x", text("x"));

        let outcome = mux.match_route(&Method::POST, "/x");
        assert!(outcome.is_method_not_allowed());
        assert!(mux.match_route(&Method::GET, "/y").is_not_found());

        let response = mux.dispatch(request(Method::POST, "/x"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = mux.dispatch(request(Method::GET, "/y"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&response), "404 page not found\n");
    }

    #[test]
    fn test_custom_error_handler_sees_method_mismatch() {
        let mut mux = Mux::new();
        mux.get("/x", text("x"));
        mux.error_handler(|_req, err| {
            let mut response = Response::new(Body::from(err.to_string()));
            *response.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
            response
        });
        mux.not_found_handler(|_req| Response::new(Body::from_static(b"custom 404")));

        let response = mux.dispatch(request(Method::DELETE, "/x"));
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body(&response), "method not allowed: DELETE /x");

        let response = mux.dispatch(request(Method::GET, "/nothing"));
        assert_eq!(body(&response), "custom 404");
    }

    #[test]
    fn test_find_renders_ancestor_chain() {
        let mut mux = Mux::new();
        let mut parent = mux.group("/parent").name("parent");
        parent.get("/child", text("child")).name("child");

        let node = mux.find("parent:child").unwrap();
        assert_eq!(mux.full_pattern(node.id()).unwrap(), "/parent/child");
        assert!(mux.find("child").is_none());
        assert!(mux.find("").is_none());
    }

    #[test]
    fn test_reverse_errors() {
        let mut mux = Mux::new();
        mux.get("/a/<<b>>", text("a")).name("a");

        assert_eq!(
            mux.reverse("a", Vec::<String>::new()),
            Err(ReverseError::NotEnoughVariables)
        );
        assert_eq!(
            mux.reverse("a", ["1", "2"]),
            Err(ReverseError::TooManyVariables)
        );
        assert_eq!(
            mux.reverse("missing", ["1"]),
            Err(ReverseError::RouteNotFound {
                name: "missing".to_string()
            })
        );
        assert_eq!(mux.reverse("a", [7]).unwrap(), "/a/7");
    }

    #[test]
    fn test_variables_and_route_info_in_context() {
        let mut mux = Mux::new();
        let mut hello = mux.group("/hello").name("hello");
        hello
            .get("/<<name>>/<<age>>", |req: Request<Body>| {
                let vars = context::vars(&req).unwrap();
                let info = context::route_info(&req).unwrap();
                Response::new(Body::from(format!(
                    "{} {} {} {}",
                    vars.get("name"),
                    vars.get_int("age"),
                    info.name,
                    info.pattern
                )))
            })
            .name("person");

        let response = mux.dispatch(request(Method::GET, "/hello/john/20"));
        assert_eq!(body(&response), "john 20 person /hello/<<name>>/<<age>>");
    }

    #[test]
    fn test_middleware_order() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut mux = Mux::new();
        mux.use_middleware(tag("global", log.clone()));

        let mut api = mux.group("/api").middleware(tag("ancestor", log.clone()));
        api.get("/users", text("users"))
            .middleware(tag("node", log.clone()))
            .pre_middleware(tag("pre", log.clone()));

        mux.dispatch(request(Method::GET, "/api/users"));
        assert_eq!(*log.lock().unwrap(), ["pre", "global", "ancestor", "node"]);
    }

    #[test]
    fn test_disable_middleware_keeps_pre_middleware() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut mux = Mux::new();
        mux.use_middleware(tag("global", log.clone()));
        mux.get("/raw", text("raw"))
            .middleware(tag("node", log.clone()))
            .pre_middleware(tag("pre", log.clone()))
            .disable_middleware();

        let response = mux.dispatch(request(Method::GET, "/raw"));
        assert_eq!(body(&response), "raw");
        assert_eq!(*log.lock().unwrap(), ["pre"]);
    }

    #[test]
    fn test_middleware_can_short_circuit() {
        let mut mux = Mux::new();
        mux.use_middleware(middleware_fn(|next: BoxedHandler| -> BoxedHandler {
            Arc::new(move |req: Request<Body>| {
                if req.headers().contains_key("x-deny") {
                    let mut response = Response::new(Body::new());
                    *response.status_mut() = StatusCode::FORBIDDEN;
                    return response;
                }
                let mut response = next.serve(req);
                response
                    .headers_mut()
                    .insert("x-seen", HeaderValue::from_static("1"));
                response
            })
        }));
        mux.get("/", text("ok"));

        let response = mux.dispatch(request(Method::GET, "/"));
        assert_eq!(response.headers()["x-seen"], "1");

        let mut denied = request(Method::GET, "/");
        denied
            .headers_mut()
            .insert("x-deny", HeaderValue::from_static("1"));
        assert_eq!(mux.dispatch(denied).status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_remove_by_path() {
        let mut mux = Mux::new();
        let mut hello = mux.get("/hello", text("hello"));
        hello.get("/world", text("world"));

        assert!(mux.remove_by_path("/hello/world/"));
        assert!(mux.match_route(&Method::GET, "/hello/world").is_not_found());
        assert!(mux.match_route(&Method::GET, "/hello").is_matched());
        assert!(!mux.remove_by_path("/hello/world"));
    }

    #[test]
    fn test_find_follows_renames_and_removals() {
        let mut mux = Mux::new();
        let id = mux.get("/a", text("a")).name("a").id();
        assert_eq!(mux.find("a").map(RouteNode::id), Some(id));
        assert_eq!(mux.find("a").map(RouteNode::id), Some(id));

        mux.route_mut(id).unwrap().name("renamed");
        assert!(mux.find("a").is_none());
        assert!(mux.find("renamed").is_some());

        mux.remove_by_path("/a");
        assert!(mux.find("renamed").is_none());
        assert!(mux.route_mut(id).is_none());
    }

    #[cfg(feature = "cache")]
    #[test]
    fn test_name_cache_stats() {
        let mut mux = Mux::new();
        mux.get("/a", text("a")).name("a");
        mux.find("a");
        mux.find("a");
        mux.find("a");

        let stats = mux.cache_stats().unwrap();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);

        mux.get("/b", text("b"));
        let stats = mux.cache_stats().unwrap();
        assert_eq!(stats.invalidations, 1);
    }

    #[test]
    fn test_percent_decode() {
        let mut mux = Mux::with_config(MuxConfig::new().percent_decode(true));
        mux.get("/files/<<name>>", |req: Request<Body>| {
            let name = context::vars(&req).unwrap().get("name").to_string();
            Response::new(Body::from(name))
        });

        let response = mux.dispatch(request(Method::GET, "/files/hello%20world"));
        assert_eq!(body(&response), "hello world");

        let raw = Mux::new();
        assert_eq!(raw.split("/files/a%20b"), ["files", "a%20b"]);
    }

    #[test]
    fn test_reverse_round_trips_with_percent_decode() {
        let mut mux = Mux::with_config(MuxConfig::new().percent_decode(true));
        mux.get("/files/<<name>>", |req: Request<Body>| {
            let name = context::vars(&req).unwrap().get("name").to_string();
            Response::new(Body::from(name))
        })
        .name("file");

        let path = mux.reverse("file", ["a/b c"]).unwrap();
        assert_eq!(path, "/files/a%2Fb%20c");
        let response = mux.dispatch(request(Method::GET, &path));
        assert_eq!(body(&response), "a/b c");
    }

    #[test]
    fn test_custom_grammar() {
        let config = MuxConfig::new().variable_markers("{", "}");
        let mut mux = Mux::try_with_config(config).unwrap();
        mux.get("/users/{id}", text("user")).name("user");

        assert!(mux.match_route(&Method::GET, "/users/3").is_matched());
        assert_eq!(mux.reverse("user", ["3"]).unwrap(), "/users/3");
    }

    #[test]
    fn test_invalid_config() {
        let result = Mux::try_with_config(MuxConfig::new().wildcard("/"));
        assert!(matches!(result, Err(ConfigError::Conflict(_))));
    }

    #[test]
    #[should_panic(expected = "Invalid mux configuration")]
    fn test_with_config_panics() {
        Mux::with_config(MuxConfig::new().delimiter(""));
    }

    #[test]
    #[should_panic(expected = "Invalid route pattern")]
    fn test_handle_panics_on_bad_pattern() {
        let mut mux = Mux::new();
        mux.get("/a/*/b", text("bad"));
    }

    #[test]
    fn test_try_handle_leaves_tree_untouched() {
        let mut mux = Mux::new();
        let result = mux.try_handle(Method::GET, "/a/<<>>", text("bad"));
        assert!(matches!(result, Err(PatternError::EmptyVariableName { .. })));
        assert!(mux.tree().is_empty());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut mux = Mux::new();
        mux.get("/a", text("a"));
        let mut copy = mux.clone();
        copy.get("/b", text("b"));

        assert!(mux.match_route(&Method::GET, "/b").is_not_found());
        assert!(copy.match_route(&Method::GET, "/b").is_matched());
        assert!(copy.match_route(&Method::GET, "/a").is_matched());
    }

    #[test]
    fn test_mux_mounted_as_handler() {
        let mut inner = Mux::new();
        inner.get("/api/ping", text("pong"));

        let mut outer = Mux::new();
        outer.any("/api/*", inner);

        let response = outer.dispatch(request(Method::GET, "/api/ping"));
        assert_eq!(body(&response), "pong");
    }
}
