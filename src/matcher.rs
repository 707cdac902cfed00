//! Hierarchical route matching
//!
//! The tree is searched depth first. Roots and siblings are tried in
//! registration order, and each node consumes its own segments starting at
//! the offset its parent stopped at:
//!
//! - a node that fails ends that branch
//! - a node that consumes the whole path and has a handler decides the
//!   search: it matches if its method allows the request, otherwise the
//!   search stops with [`MatchOutcome::MethodNotAllowed`]
//! - a node that consumes the whole path but has no handler, or consumes
//!   only part of it, hands the rest to its children
//!
//! A method mismatch is final. Later siblings are not consulted, so a path
//! registered for `GET` answers `POST` with 405 rather than falling through
//! to some other route.

use crate::params::Variables;
use crate::pattern::MatchStep;
use crate::route::{NodeId, RouteNode, RouteTree};
use crate::trace_log;
use http::Method;

/// A successful match: the node to dispatch to and everything captured on the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub node: NodeId,
    pub variables: Variables,
}

/// Result of matching a request against a route tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A routable node accepted both path and method
    Matched(RouteMatch),
    /// A routable node accepted the path but not the method
    MethodNotAllowed { node: NodeId },
    /// Nothing accepted the path
    NotFound,
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }

    pub fn is_method_not_allowed(&self) -> bool {
        matches!(self, MatchOutcome::MethodNotAllowed { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MatchOutcome::NotFound)
    }

    /// The match, if there was one
    pub fn route_match(&self) -> Option<&RouteMatch> {
        match self {
            MatchOutcome::Matched(route_match) => Some(route_match),
            _ => None,
        }
    }

    /// Node the outcome refers to, for both matches and method mismatches
    pub fn node(&self) -> Option<NodeId> {
        match self {
            MatchOutcome::Matched(route_match) => Some(route_match.node),
            MatchOutcome::MethodNotAllowed { node } => Some(*node),
            MatchOutcome::NotFound => None,
        }
    }

    pub fn into_route_match(self) -> Option<RouteMatch> {
        match self {
            MatchOutcome::Matched(route_match) => Some(route_match),
            _ => None,
        }
    }
}

/// Match a split request path against every root of `tree`
pub fn match_tree(tree: &RouteTree, method: &Method, path: &[&str]) -> MatchOutcome {
    let matcher = TreeMatcher { tree, method, path };
    matcher.first_of(tree.roots(), 0, &Variables::new())
}

struct TreeMatcher<'a> {
    tree: &'a RouteTree,
    method: &'a Method,
    path: &'a [&'a str],
}

impl TreeMatcher<'_> {
    fn first_of(&self, candidates: &[NodeId], offset: usize, vars: &Variables) -> MatchOutcome {
        for &id in candidates {
            match self.match_node(id, offset, vars) {
                MatchOutcome::NotFound => continue,
                outcome => return outcome,
            }
        }
        MatchOutcome::NotFound
    }

    fn match_node(&self, id: NodeId, offset: usize, inherited: &Variables) -> MatchOutcome {
        let Some(node) = self.tree.get(id) else {
            return MatchOutcome::NotFound;
        };

        let mut vars = inherited.clone();
        match node.pattern().match_at(self.path, offset, &mut vars) {
            MatchStep::Fail => MatchOutcome::NotFound,
            MatchStep::Full if node.is_routable() => self.decide(node, vars),
            MatchStep::Full => self.first_of(node.children(), self.path.len(), &vars),
            MatchStep::Partial(next) => self.first_of(node.children(), next, &vars),
        }
    }

    fn decide(&self, node: &RouteNode, variables: Variables) -> MatchOutcome {
        if node.method().allows(self.method) {
            trace_log!("Route {} matched {} request", node.id(), self.method);
            MatchOutcome::Matched(RouteMatch {
                node: node.id(),
                variables,
            })
        } else {
            trace_log!(
                "Route {} matched path but accepts {}, not {}",
                node.id(),
                node.method(),
                self.method
            );
            MatchOutcome::MethodNotAllowed { node: node.id() }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MuxConfig;
    use crate::handler::Body;
    use crate::pattern::split_path;
    use crate::route::{Route, RouteMethod};
    use http::{Request, Response};

    fn ok(_req: Request<Body>) -> Response<Body> {
        Response::new(Body::new())
    }

    fn run(tree: &RouteTree, method: Method, path: &str) -> MatchOutcome {
        match_tree(tree, &method, &split_path(path, "/"))
    }

    fn attach(tree: &mut RouteTree, parent: Option<NodeId>, method: RouteMethod, pattern: &str) -> NodeId {
        tree.attach_child(parent, method, pattern, ok, &MuxConfig::default())
            .unwrap()
    }

    #[test]
    fn test_match_root_and_children() {
        let mut tree = RouteTree::new();
        let index = attach(&mut tree, None, Method::GET.into(), "/");
        let hello = attach(&mut tree, None, Method::GET.into(), "/hello/");
        let world = attach(&mut tree, Some(hello), Method::GET.into(), "/world/");
        let name = attach(&mut tree, Some(hello), Method::GET.into(), "/<<name>>/");

        assert_eq!(run(&tree, Method::GET, "/").node(), Some(index));
        assert_eq!(run(&tree, Method::GET, "/hello").node(), Some(hello));
        assert_eq!(run(&tree, Method::GET, "/hello/world").node(), Some(world));

        let outcome = run(&tree, Method::GET, "/hello/john/");
        assert_eq!(outcome.node(), Some(name));
        assert_eq!(outcome.route_match().unwrap().variables.get("name"), "john");

        assert!(run(&tree, Method::GET, "/hello/john/extra").is_not_found());
        assert!(run(&tree, Method::GET, "/other").is_not_found());
    }

    #[test]
    fn test_sibling_registration_order() {
        let mut tree = RouteTree::new();
        let hello = attach(&mut tree, None, Method::GET.into(), "/hello");
        let variable = attach(&mut tree, Some(hello), Method::GET.into(), "/<<name>>");
        attach(&mut tree, Some(hello), Method::GET.into(), "/world");

        // The variable sibling was registered first and accepts "world" too
        assert_eq!(run(&tree, Method::GET, "/hello/world").node(), Some(variable));
    }

    #[test]
    fn test_method_not_allowed_is_final() {
        let mut tree = RouteTree::new();
        let get = attach(&mut tree, None, Method::GET.into(), "/x");
        attach(&mut tree, None, Method::POST.into(), "/x");

        let outcome = run(&tree, Method::POST, "/x");
        assert_eq!(outcome, MatchOutcome::MethodNotAllowed { node: get });
        assert!(run(&tree, Method::GET, "/y").is_not_found());
        assert!(run(&tree, Method::GET, "/x").is_matched());
    }

    #[test]
    fn test_any_method() {
        let mut tree = RouteTree::new();
        attach(&mut tree, None, RouteMethod::Any, "/any");
        assert!(run(&tree, Method::DELETE, "/any").is_matched());
        assert!(run(&tree, Method::OPTIONS, "/any").is_matched());
    }

    #[test]
    fn test_group_falls_through_to_children() {
        let mut tree = RouteTree::new();
        let route = Route::group("/static").child(Route::new(Method::GET, "/*", ok));
        tree.add_route(None, route, &MuxConfig::default()).unwrap();

        let outcome = run(&tree, Method::GET, "/static");
        let route_match = outcome.into_route_match().unwrap();
        assert!(route_match.variables.get_all("*").is_empty());

        let outcome = run(&tree, Method::GET, "/static/css/site.css");
        let route_match = outcome.into_route_match().unwrap();
        assert_eq!(route_match.variables.get_all("*"), ["css", "site.css"]);
    }

    #[test]
    fn test_group_without_matching_child_is_not_found() {
        let mut tree = RouteTree::new();
        let route = Route::group("/api").child(Route::new(Method::GET, "/users", ok));
        tree.add_route(None, route, &MuxConfig::default()).unwrap();

        assert!(run(&tree, Method::GET, "/api").is_not_found());
        assert!(run(&tree, Method::GET, "/api/users").is_matched());
    }

    #[test]
    fn test_variable_multiplicity_across_levels() {
        let mut tree = RouteTree::new();
        let outer = attach(&mut tree, None, RouteMethod::Any, "/<<name>>");
        let inner = attach(&mut tree, Some(outer), RouteMethod::Any, "/<<name>>");

        let outcome = run(&tree, Method::GET, "/john/jane");
        let route_match = outcome.into_route_match().unwrap();
        assert_eq!(route_match.node, inner);
        assert_eq!(route_match.variables.get_all("name"), ["john", "jane"]);
    }

    #[test]
    fn test_failed_branch_does_not_leak_variables() {
        let mut tree = RouteTree::new();
        let root = attach(&mut tree, None, RouteMethod::Any, "/a");
        let first = attach(&mut tree, Some(root), RouteMethod::Any, "/<<x>>");
        attach(&mut tree, Some(first), RouteMethod::Any, "/never");
        attach(&mut tree, Some(root), RouteMethod::Any, "/<<y>>/other");

        let outcome = run(&tree, Method::GET, "/a/b/other");
        let route_match = outcome.into_route_match().unwrap();
        assert_eq!(route_match.variables.get("y"), "b");
        assert!(!route_match.variables.contains("x"));
    }

    #[test]
    fn test_match_is_repeatable() {
        let mut tree = RouteTree::new();
        let root = attach(&mut tree, None, RouteMethod::Any, "/hello/world/<<name>>/<<age>>/*");
        let first = run(&tree, Method::GET, "/hello/world/john/20/a/b");
        let second = run(&tree, Method::GET, "/hello/world/john/20/a/b");
        assert_eq!(first, second);
        assert_eq!(first.node(), Some(root));
    }
}
