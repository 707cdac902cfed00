//! Error handling for the router
//!
//! Errors fall in three groups:
//!
//! - construction-time: [`PatternError`] and [`ConfigError`], raised while a
//!   route tree is being built and meant to abort setup
//! - reverse-time: [`ReverseError`], returned to callers of `reverse`/`find`
//! - dispatch-time: [`DispatchError`], handed to the configurable error
//!   handler held by [`ErrorHandlers`]
//!
//! Panics raised by handlers are not caught here; recovering from them is a
//! middleware concern.

use crate::handler::Body;
use crate::route::NodeId;
use http::{Request, Response, StatusCode};
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// A path pattern could not be compiled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The wildcard token appeared before the last segment
    #[error("wildcard must be the last segment of '{pattern}', it matches an unknown number of segments")]
    WildcardNotLast { pattern: String },

    /// A variable segment had nothing between its markers
    #[error("variable segment in '{pattern}' has an empty name")]
    EmptyVariableName { pattern: String },

    /// A route was attached below a wildcard route
    #[error("cannot attach '{pattern}' below wildcard route '{parent}'")]
    WildcardParent { parent: String, pattern: String },

    /// The parent node is not (or no longer) part of the tree
    #[error("cannot attach '{pattern}' below unknown route {parent}")]
    UnknownParent { parent: NodeId, pattern: String },
}

/// Invalid router configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A grammar token was empty
    #[error("configuration token '{0}' cannot be empty")]
    EmptyToken(&'static str),

    /// Two grammar tokens overlap
    #[error("conflicting configuration: {0}")]
    Conflict(String),

    /// A namespace was created without any hook
    #[error("namespace options must set at least one of on_route_added or on_route_serve")]
    NamespaceWithoutHooks,
}

/// Building a concrete path from a route failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReverseError {
    /// A variable segment had no value left to consume
    #[error("not enough variables provided to replace in path")]
    NotEnoughVariables,

    /// Values were left over after rendering a non-wildcard route
    #[error("too many variables provided to replace in path")]
    TooManyVariables,

    /// No route is registered under the requested name
    #[error("route not found: {name}")]
    RouteNotFound { name: String },

    /// A wildcard resolver refused to render its suffix
    #[error("resolver failed: {0}")]
    Resolver(String),
}

/// A request matched structurally but could not be dispatched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// A route matched the path but not the request method
    #[error("method not allowed: {method} {path}")]
    MethodNotAllowed { method: String, path: String },
}

// ============================================================================
// Error Handlers
// ============================================================================

/// Handler invoked when no route matches the request path
pub type NotFoundHandler = Arc<dyn Fn(Request<Body>) -> Response<Body> + Send + Sync>;

/// Handler invoked when dispatch fails after a structural match
pub type ErrorHandler = Arc<dyn Fn(Request<Body>, &DispatchError) -> Response<Body> + Send + Sync>;

/// Not-found and error policy of a [`Mux`](crate::Mux)
#[derive(Clone, Default)]
pub struct ErrorHandlers {
    /// Handler for requests nothing matched
    pub not_found: Option<NotFoundHandler>,

    /// Handler for dispatch errors such as method mismatches
    pub error: Option<ErrorHandler>,
}

impl ErrorHandlers {
    /// Create handlers that fall back to the plain-text defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the not-found handler
    pub fn on_not_found<F>(mut self, handler: F) -> Self
    where
        F: Fn(Request<Body>) -> Response<Body> + Send + Sync + 'static,
    {
        self.not_found = Some(Arc::new(handler));
        self
    }

    /// Set the error handler
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(Request<Body>, &DispatchError) -> Response<Body> + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(handler));
        self
    }

    /// Produce the not-found response for a request
    pub fn not_found(&self, req: Request<Body>) -> Response<Body> {
        match &self.not_found {
            Some(handler) => handler(req),
            None => text_response(StatusCode::NOT_FOUND, "404 page not found\n"),
        }
    }

    /// Produce the error response for a request.
    ///
    /// The default reports every error, including a method mismatch, as a
    /// generic 500.
    pub fn error(&self, req: Request<Body>, err: &DispatchError) -> Response<Body> {
        match &self.error {
            Some(handler) => handler(req, err),
            None => text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error\n"),
        }
    }
}

impl std::fmt::Debug for ErrorHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorHandlers")
            .field("not_found", &self.not_found.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// Build a plain-text response with the given status
pub(crate) fn text_response(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from_static(body.as_bytes()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request<Body> {
        Request::builder()
            .uri("/missing")
            .body(Body::new())
            .unwrap()
    }

    #[test]
    fn test_reverse_error_display() {
        assert_eq!(
            ReverseError::NotEnoughVariables.to_string(),
            "not enough variables provided to replace in path"
        );
        assert_eq!(
            ReverseError::TooManyVariables.to_string(),
            "too many variables provided to replace in path"
        );
        let error = ReverseError::RouteNotFound {
            name: "users:detail".to_string(),
        };
        assert_eq!(error.to_string(), "route not found: users:detail");
    }

    #[test]
    fn test_pattern_error_display() {
        let error = PatternError::WildcardNotLast {
            pattern: "/a/*/b".to_string(),
        };
        assert!(error.to_string().contains("/a/*/b"));
    }

    #[test]
    fn test_default_not_found() {
        let handlers = ErrorHandlers::new();
        let response = handlers.not_found(request());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(&response.body()[..], b"404 page not found\n");
    }

    #[test]
    fn test_default_error_is_500() {
        let handlers = ErrorHandlers::new();
        let error = DispatchError::MethodNotAllowed {
            method: "POST".to_string(),
            path: "/x".to_string(),
        };
        let response = handlers.error(request(), &error);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_custom_handlers() {
        let handlers = ErrorHandlers::new()
            .on_not_found(|req| {
                Response::new(Body::from(format!("nothing at {}", req.uri().path())))
            })
            .on_error(|_req, err| {
                let mut response = Response::new(Body::from(err.to_string()));
                *response.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
                response
            });

        assert!(handlers.not_found.is_some());
        assert!(handlers.error.is_some());

        let response = handlers.not_found(request());
        assert_eq!(&response.body()[..], b"nothing at /missing");

        let error = DispatchError::MethodNotAllowed {
            method: "POST".to_string(),
            path: "/x".to_string(),
        };
        let response = handlers.error(request(), &error);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(&response.body()[..], b"method not allowed: POST /x");
    }
}
