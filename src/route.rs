//! Route tree: nodes, the arena holding them, and subtree builders
//!
//! Nodes live in an arena indexed by [`NodeId`]. Parent and child links are
//! ids, never references, so detaching a subtree is a matter of dropping an
//! id from one list and freeing the slots below it. Ids are never reused.

use crate::config::MuxConfig;
use crate::error::PatternError;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{BoxedMiddleware, Middleware};
use crate::pattern::{trim_delimiter, Pattern, PatternChain};
use http::Method;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Identifiers and methods
// ============================================================================

/// Stable identifier of a node inside one route tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena index of the node
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// HTTP method a route answers to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    /// Accept every method
    Any,
    /// Accept exactly this method
    Exact(Method),
}

impl RouteMethod {
    /// Check if a request method is accepted
    pub fn allows(&self, method: &Method) -> bool {
        match self {
            RouteMethod::Any => true,
            RouteMethod::Exact(expected) => expected == method,
        }
    }
}

impl From<Method> for RouteMethod {
    fn from(method: Method) -> Self {
        RouteMethod::Exact(method)
    }
}

impl From<&Method> for RouteMethod {
    fn from(method: &Method) -> Self {
        RouteMethod::Exact(method.clone())
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMethod::Any => f.write_str("ANY"),
            RouteMethod::Exact(method) => f.write_str(method.as_str()),
        }
    }
}

// ============================================================================
// Route (subtree builder)
// ============================================================================

/// A route and its children, built outside any router and grafted later
///
/// # Example
///
/// ```
/// use route_mux::{Body, Mux, Route};
/// use http::{Method, Request, Response};
///
/// let users = Route::group("/users")
///     .name("users")
///     .child(
///         Route::new(Method::GET, "/<<id>>", |_req: Request<Body>| {
///             Response::new(Body::new())
///         })
///         .name("detail"),
///     );
///
/// let mut mux = Mux::new();
/// mux.add_route(users);
/// assert_eq!(mux.reverse("users:detail", ["42"]).unwrap(), "/users/42");
/// ```
pub struct Route {
    pub(crate) method: RouteMethod,
    pub(crate) pattern: String,
    pub(crate) handler: Option<BoxedHandler>,
    pub(crate) name: String,
    pub(crate) middleware: Vec<BoxedMiddleware>,
    pub(crate) pre_middleware: Vec<BoxedMiddleware>,
    pub(crate) middleware_disabled: bool,
    pub(crate) children: Vec<Route>,
}

impl Route {
    /// Create a route serving `method` requests on `pattern`
    pub fn new<H: Handler>(
        method: impl Into<RouteMethod>,
        pattern: impl Into<String>,
        handler: H,
    ) -> Self {
        Self {
            handler: Some(Arc::new(handler)),
            ..Self::bare(method.into(), pattern.into())
        }
    }

    /// Create a handler-less grouping route.
    ///
    /// A group only contributes its pattern, middleware and children; a
    /// request ending on it falls through to its children.
    pub fn group(pattern: impl Into<String>) -> Self {
        Self::bare(RouteMethod::Any, pattern.into())
    }

    fn bare(method: RouteMethod, pattern: String) -> Self {
        Self {
            method,
            pattern,
            handler: None,
            name: String::new(),
            middleware: Vec::new(),
            pre_middleware: Vec::new(),
            middleware_disabled: false,
            children: Vec::new(),
        }
    }

    /// Set the route name used by lookups and reversal
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a child route
    pub fn child(mut self, child: Route) -> Self {
        self.children.push(child);
        self
    }

    /// Add multiple child routes
    pub fn children(mut self, children: Vec<Route>) -> Self {
        self.children.extend(children);
        self
    }

    /// Add middleware to this route
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Add already boxed middleware to this route
    pub fn middlewares(mut self, middleware: Vec<BoxedMiddleware>) -> Self {
        self.middleware.extend(middleware);
        self
    }

    /// Add middleware that always runs outermost, even when middleware is disabled
    pub fn pre_middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.pre_middleware.push(Arc::new(middleware));
        self
    }

    /// Skip global, ancestor and own middleware for this route
    pub fn disable_middleware(mut self) -> Self {
        self.middleware_disabled = true;
        self
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_pattern(&self) -> &str {
        &self.pattern
    }

    pub fn get_children(&self) -> &[Route] {
        &self.children
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("name", &self.name)
            .field("handler", &self.handler.is_some())
            .field("middleware_count", &self.middleware.len())
            .field("children", &self.children)
            .finish()
    }
}

// ============================================================================
// RouteNode
// ============================================================================

/// A node of the route tree
#[derive(Clone)]
pub struct RouteNode {
    id: NodeId,
    name: String,
    method: RouteMethod,
    pattern: Pattern,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    middleware: Vec<BoxedMiddleware>,
    pre_middleware: Vec<BoxedMiddleware>,
    middleware_disabled: bool,
    handler: Option<BoxedHandler>,
}

impl RouteNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> &RouteMethod {
        &self.method
    }

    /// The node's own declared pattern, without its ancestors
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn middleware(&self) -> &[BoxedMiddleware] {
        &self.middleware
    }

    pub fn pre_middleware(&self) -> &[BoxedMiddleware] {
        &self.pre_middleware
    }

    pub fn is_middleware_disabled(&self) -> bool {
        self.middleware_disabled
    }

    pub fn handler(&self) -> Option<&BoxedHandler> {
        self.handler.as_ref()
    }

    /// Check if requests can end on this node
    pub fn is_routable(&self) -> bool {
        self.handler.is_some()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn push_middleware(&mut self, middleware: BoxedMiddleware) {
        self.middleware.push(middleware);
    }

    pub(crate) fn push_pre_middleware(&mut self, middleware: BoxedMiddleware) {
        self.pre_middleware.push(middleware);
    }

    pub(crate) fn disable_middleware(&mut self) {
        self.middleware_disabled = true;
    }
}

impl fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("middleware_count", &self.middleware.len())
            .field("pre_middleware_count", &self.pre_middleware.len())
            .field("middleware_disabled", &self.middleware_disabled)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

// ============================================================================
// RouteTree
// ============================================================================

/// Arena of route nodes with an ordered list of roots
#[derive(Clone, Default)]
pub struct RouteTree {
    nodes: Vec<Option<RouteNode>>,
    roots: Vec<NodeId>,
}

/// A parsed route waiting to be linked into the arena
struct Prepared {
    route: Route,
    pattern: Pattern,
    children: Vec<Prepared>,
}

impl RouteTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&RouteNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut RouteNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Root nodes in registration order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Iterate over live nodes in arena order
    pub fn iter(&self) -> impl Iterator<Item = &RouteNode> {
        self.nodes.iter().flatten()
    }

    /// Ancestors of a node, root first, excluding the node itself
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.get(id).and_then(RouteNode::parent);
        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.get(parent).and_then(RouteNode::parent);
        }
        ancestors.reverse();
        ancestors
    }

    /// Effective pattern of a node: its ancestors' patterns followed by its own
    pub fn chain(&self, id: NodeId) -> PatternChain<'_> {
        let links = self
            .ancestors(id)
            .into_iter()
            .chain(std::iter::once(id))
            .filter_map(|node| self.get(node))
            .map(RouteNode::pattern)
            .collect();
        PatternChain::new(links)
    }

    /// Attach a single route below `parent` (or as a root)
    pub fn attach_child<H: Handler>(
        &mut self,
        parent: Option<NodeId>,
        method: impl Into<RouteMethod>,
        pattern: &str,
        handler: H,
        config: &MuxConfig,
    ) -> Result<NodeId, PatternError> {
        self.add_route(parent, Route::new(method, pattern, handler), config)
    }

    /// Graft a built subtree below `parent` (or as a root).
    ///
    /// Every pattern of the subtree is parsed before anything is linked, so
    /// on error the tree is left untouched.
    pub fn add_route(
        &mut self,
        parent: Option<NodeId>,
        route: Route,
        config: &MuxConfig,
    ) -> Result<NodeId, PatternError> {
        if let Some(id) = parent.filter(|id| !self.contains(*id)) {
            return Err(PatternError::UnknownParent {
                parent: id,
                pattern: route.pattern,
            });
        }
        let wildcard_parent = match parent {
            Some(id) if self.chain(id).is_wildcard() => Some(self.chain(id).render(config)),
            _ => None,
        };
        let prepared = Self::prepare(route, wildcard_parent, config)?;
        Ok(self.commit(parent, prepared))
    }

    fn prepare(
        route: Route,
        wildcard_parent: Option<String>,
        config: &MuxConfig,
    ) -> Result<Prepared, PatternError> {
        if let Some(parent) = wildcard_parent {
            return Err(PatternError::WildcardParent {
                parent,
                pattern: route.pattern,
            });
        }

        let pattern = Pattern::parse_for(&route.pattern, config, route.handler.as_deref())?;
        let mut route = route;
        let children = std::mem::take(&mut route.children);

        let below = pattern.is_wildcard().then(|| pattern.render(config));
        let children = children
            .into_iter()
            .map(|child| Self::prepare(child, below.clone(), config))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Prepared {
            route,
            pattern,
            children,
        })
    }

    fn commit(&mut self, parent: Option<NodeId>, prepared: Prepared) -> NodeId {
        let id = NodeId(self.nodes.len());
        let Prepared {
            route,
            pattern,
            children,
        } = prepared;

        self.nodes.push(Some(RouteNode {
            id,
            name: route.name,
            method: route.method,
            pattern,
            parent,
            children: Vec::with_capacity(children.len()),
            middleware: route.middleware,
            pre_middleware: route.pre_middleware,
            middleware_disabled: route.middleware_disabled,
            handler: route.handler,
        }));

        match parent.and_then(|parent| self.get_mut(parent)) {
            Some(node) => node.children.push(id),
            None => self.roots.push(id),
        }

        for child in children {
            self.commit(Some(id), child);
        }
        id
    }

    /// Detach a node and free its whole subtree
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.get(id).map(RouteNode::parent) else {
            return false;
        };

        match parent {
            Some(parent) => {
                if let Some(parent) = self.get_mut(parent) {
                    parent.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(slot) = self.nodes.get_mut(current.0) {
                if let Some(node) = slot.take() {
                    pending.extend(node.children);
                }
            }
        }
        true
    }

    /// Depth-first walk over live nodes, each node before its children
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut pending: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            if let Some(node) = self.get(id) {
                order.push(id);
                pending.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// First node, depth first, whose rendered full pattern equals `path`.
    ///
    /// Leading and trailing delimiters are ignored on both sides.
    pub fn find_by_path(&self, path: &str, config: &MuxConfig) -> Option<NodeId> {
        let target = trim_delimiter(path, &config.delimiter);
        self.walk().into_iter().find(|id| {
            let rendered = self.chain(*id).render(config);
            trim_delimiter(&rendered, &config.delimiter) == target
        })
    }

    /// Find a node by its colon-separated name path, e.g. `users:detail`.
    ///
    /// Each component must equal the name of the node at the matching depth.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let components: Vec<&str> = name.split(':').collect();
        self.roots
            .iter()
            .find_map(|root| self.find_in(*root, &components))
    }

    fn find_in(&self, id: NodeId, components: &[&str]) -> Option<NodeId> {
        let (first, rest) = components.split_first()?;
        let node = self.get(id)?;
        if node.name != *first {
            return None;
        }
        if rest.is_empty() {
            return Some(id);
        }
        node.children
            .iter()
            .find_map(|child| self.find_in(*child, rest))
    }
}

impl fmt::Debug for RouteTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTree")
            .field("roots", &self.roots)
            .field("len", &self.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
