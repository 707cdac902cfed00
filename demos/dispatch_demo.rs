//! Dispatch Demo
//!
//! Builds a small route tree and pushes a handful of requests through it,
//! printing each response. Run with `RUST_LOG=debug` to see registration
//! and dispatch decisions:
//!
//! ```text
//! RUST_LOG=route_mux=trace cargo run --example dispatch_demo
//! ```

use http::{HeaderValue, Method, Request, Response, StatusCode};
use route_mux::{context, middleware_fn, Body, BoxedHandler, Handler, Mux, Namespace, NamespaceOptions};
use std::sync::Arc;
use std::time::Instant;

fn index(_req: Request<Body>) -> Response<Body> {
    Response::new(Body::from_static(b"welcome"))
}

fn user(req: Request<Body>) -> Response<Body> {
    let vars = context::vars(&req).cloned().unwrap_or_default();
    Response::new(Body::from(format!("user #{}", vars.get_int("id"))))
}

fn asset(req: Request<Body>) -> Response<Body> {
    let vars = context::vars(&req).cloned().unwrap_or_default();
    Response::new(Body::from(format!("asset {}", vars.get_all("*").join("/"))))
}

fn report(req: Request<Body>) -> Response<Body> {
    let route = context::route_info(&req)
        .map(|info| format!("{} ({})", info.pattern, info.name))
        .unwrap_or_default();
    Response::new(Body::from(route))
}

fn main() {
    env_logger::init();

    let mut mux = Mux::new();

    // Timing middleware applied to every route
    mux.use_middleware(middleware_fn(|next: BoxedHandler| -> BoxedHandler {
        Arc::new(move |req: Request<Body>| {
            let started = Instant::now();
            let mut response = next.serve(req);
            let elapsed = format!("{}us", started.elapsed().as_micros());
            if let Ok(value) = HeaderValue::from_str(&elapsed) {
                response.headers_mut().insert("x-elapsed", value);
            }
            response
        })
    }));

    mux.get("/", index).name("index");
    mux.get("/assets/*", asset).name("assets");

    {
        let mut users = mux.group("/users").name("users");
        users.get("/<<id>>", user).name("detail");
        users.get("/<<id>>/report", report).name("report");
    }

    {
        let mut admin = Namespace::new(
            &mut mux,
            NamespaceOptions::new().on_route_added(|route| {
                println!("admin route added: {}", route.full_pattern());
                route
            }),
        );
        admin.delete("/admin/cache", |_req: Request<Body>| {
            let mut response = Response::new(Body::from_static(b"cache cleared"));
            *response.status_mut() = StatusCode::ACCEPTED;
            response
        });
    }

    let requests = [
        (Method::GET, "/"),
        (Method::GET, "/users/42"),
        (Method::GET, "/users/42/report"),
        (Method::GET, "/assets/css/site.css"),
        (Method::DELETE, "/admin/cache"),
        (Method::POST, "/users/42"),
        (Method::GET, "/missing"),
    ];

    for (method, path) in requests {
        let req = match Request::builder().method(method.clone()).uri(path).body(Body::new()) {
            Ok(req) => req,
            Err(err) => {
                eprintln!("invalid request {} {}: {}", method, path, err);
                continue;
            }
        };
        let response = mux.serve(req);
        println!(
            "{:<7} {:<22} -> {} {:?}",
            method,
            path,
            response.status(),
            String::from_utf8_lossy(response.body())
        );
    }

    match mux.reverse("users:report", [7]) {
        Ok(path) => println!("reverse users:report(7) = {}", path),
        Err(err) => eprintln!("reverse failed: {}", err),
    }
    match mux.reverse("assets", ["img", "logo.png"]) {
        Ok(path) => println!("reverse assets(img, logo.png) = {}", path),
        Err(err) => eprintln!("reverse failed: {}", err),
    }
}
