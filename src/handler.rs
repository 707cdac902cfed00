//! Handler and resolver capabilities
//!
//! A [`Handler`] turns a request into a response. Handlers registered on a
//! wildcard route may additionally expose a [`Resolver`], which then takes
//! over matching and reversal of everything past the wildcard.

use crate::error::ReverseError;
use crate::params::Variables;
use http::{Request, Response};
use std::sync::Arc;

/// Body type used for requests and responses
pub type Body = bytes::Bytes;

/// Something that can serve a matched request.
///
/// Closures of type `Fn(Request<Body>) -> Response<Body>` implement this
/// trait, so most routes never name it.
///
/// # Example
///
/// ```
/// use route_mux::{Body, Handler};
/// use http::{Request, Response};
///
/// struct Hello;
///
/// impl Handler for Hello {
///     fn serve(&self, _req: Request<Body>) -> Response<Body> {
///         Response::new(Body::from_static(b"hello"))
///     }
/// }
///
/// let response = Hello.serve(Request::new(Body::new()));
/// assert_eq!(&response.body()[..], b"hello");
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Serve the request
    fn serve(&self, req: Request<Body>) -> Response<Body>;

    /// Capability query for wildcard delegation.
    ///
    /// Return a resolver to take over matching and reversal of the segments
    /// after a trailing wildcard. Only consulted when the handler is
    /// registered on a wildcard route.
    fn resolver(&self) -> Option<Arc<dyn Resolver>> {
        None
    }
}

impl<F> Handler for F
where
    F: Fn(Request<Body>) -> Response<Body> + Send + Sync + 'static,
{
    fn serve(&self, req: Request<Body>) -> Response<Body> {
        self(req)
    }
}

/// Type-erased handler for dynamic dispatch
pub type BoxedHandler = Arc<dyn Handler>;

/// Wrap a closure as a [`BoxedHandler`]
pub fn handler_fn<F>(f: F) -> BoxedHandler
where
    F: Fn(Request<Body>) -> Response<Body> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Takes over matching and reversal past a wildcard boundary
///
/// # Example
///
/// ```
/// use route_mux::{ReverseError, Resolver, Variables};
///
/// /// Accepts only `<name>.txt` as the remainder of the path
/// struct TextFiles;
///
/// impl Resolver for TextFiles {
///     fn resolve(&self, _vars: &Variables, rest: &[&str]) -> Option<Variables> {
///         match rest {
///             [file] if file.ends_with(".txt") => {
///                 let mut vars = Variables::new();
///                 vars.push("file", *file);
///                 Some(vars)
///             }
///             _ => None,
///         }
///     }
///
///     fn reverse(&self, prefix: &str, values: &[String]) -> Result<String, ReverseError> {
///         match values {
///             [file] => Ok(format!("{}/{}.txt", prefix.trim_end_matches('/'), file)),
///             _ => Err(ReverseError::NotEnoughVariables),
///         }
///     }
/// }
///
/// assert!(TextFiles.resolve(&Variables::new(), &["notes.txt"]).is_some());
/// assert!(TextFiles.resolve(&Variables::new(), &["notes.md"]).is_none());
/// ```
pub trait Resolver: Send + Sync + 'static {
    /// Match the unconsumed path segments.
    ///
    /// `vars` holds everything captured before the wildcard. Returning
    /// `Some` accepts the path; the returned variables are merged into the
    /// match, replacing entries with the same name.
    fn resolve(&self, vars: &Variables, rest: &[&str]) -> Option<Variables>;

    /// Render the suffix for the given values.
    ///
    /// `prefix` is the path rendered so far (always starting with the
    /// delimiter, never ending with one unless it is the bare root). The
    /// returned string is the complete path.
    fn reverse(&self, prefix: &str, values: &[String]) -> Result<String, ReverseError>;
}

// ============================================================================
// Tests
// ============================================================================
