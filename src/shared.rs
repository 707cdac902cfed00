//! Hot-swappable router
//!
//! A [`Mux`] is configured through `&mut self` and served through `&self`.
//! To change routes while requests are in flight, [`SharedMux`] keeps the
//! current mux behind an [`ArcSwap`]: every request loads one consistent
//! snapshot, and updates clone the snapshot, edit the copy and publish it
//! atomically. Requests already running keep the tree they started with.

use crate::handler::{Body, Handler};
use crate::mux::Mux;
use crate::debug_log;
use arc_swap::ArcSwap;
use http::{Request, Response};
use std::fmt;
use std::sync::Arc;

/// A [`Mux`] that can be replaced while serving
///
/// # Example
///
/// ```
/// use route_mux::{Body, Mux, SharedMux};
/// use http::{Request, Response, StatusCode};
///
/// let shared = SharedMux::new(Mux::new());
/// let req = || Request::get("/late").body(Body::new()).unwrap();
/// assert_eq!(shared.dispatch(req()).status(), StatusCode::NOT_FOUND);
///
/// shared.update(|mux| {
///     mux.get("/late", |_req: Request<Body>| Response::new(Body::new()));
/// });
/// assert_eq!(shared.dispatch(req()).status(), StatusCode::OK);
/// ```
pub struct SharedMux {
    current: ArcSwap<Mux>,
}

impl SharedMux {
    pub fn new(mux: Mux) -> Self {
        Self {
            current: ArcSwap::from_pointee(mux),
        }
    }

    /// Current snapshot
    pub fn load(&self) -> Arc<Mux> {
        self.current.load_full()
    }

    /// Replace the whole mux
    pub fn store(&self, mux: Mux) {
        debug_log!("Publishing replacement route tree");
        self.current.store(Arc::new(mux));
    }

    /// Edit a copy of the current mux and publish it.
    ///
    /// If another update lands concurrently, `edit` runs again on the newer
    /// snapshot, so it should not have side effects beyond the mux itself.
    pub fn update<F>(&self, mut edit: F)
    where
        F: FnMut(&mut Mux),
    {
        self.current.rcu(|current| {
            let mut next = Mux::clone(current);
            edit(&mut next);
            next
        });
        debug_log!("Published updated route tree");
    }

    /// Route a request against the current snapshot
    pub fn dispatch(&self, req: Request<Body>) -> Response<Body> {
        self.current.load().dispatch(req)
    }
}

impl Handler for SharedMux {
    fn serve(&self, req: Request<Body>) -> Response<Body> {
        self.dispatch(req)
    }
}

impl Default for SharedMux {
    fn default() -> Self {
        Self::new(Mux::new())
    }
}

impl From<Mux> for SharedMux {
    fn from(mux: Mux) -> Self {
        Self::new(mux)
    }
}

impl fmt::Debug for SharedMux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedMux")
            .field("current", &**self.current.load())
            .finish()
    }
}
