mod common;

use common::{get, templates};
use http::StatusCode;
use portico::api::DeferredWriter;
use portico::binding::{uri_var, Binder, UriVars};
use portico::dispatcher::{Adapter, Serve};
use portico::handler::{ApiHandler, PageHandler};
use portico::page::PageResponse;
use portico::server::{AppService, BufferedSink, Request, RouteResolver};
use serde_json::json;
use smallvec::smallvec;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_adapter_and_service_are_thread_safe() {
    assert_send_sync::<Adapter>();
    assert_send_sync::<AppService<Routes>>();
}

#[derive(Default)]
struct Echo {
    id: u64,
}

impl ApiHandler for Echo {
    fn bind(&mut self, binder: &mut Binder<'_>) {
        binder.field("id", &mut self.id);
    }

    fn get(&mut self, w: &mut DeferredWriter<'_>, _req: &Request) {
        write!(w, "{}", self.id).unwrap();
    }
}

#[test]
fn test_concurrent_requests_do_not_share_state() {
    let adapter = Arc::new(Adapter::api(Echo::default));

    let workers: Vec<_> = (0..8u64)
        .map(|t| {
            let adapter = Arc::clone(&adapter);
            thread::spawn(move || {
                for i in 0..50u64 {
                    let id = t * 1000 + i;
                    let vars: UriVars = smallvec![(Arc::from("id"), id.to_string())];
                    let mut sink = BufferedSink::new();
                    adapter.serve(&mut sink, &get("/echo"), &vars);
                    assert_eq!(sink.body_text(), id.to_string());
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn test_constructor_runs_once_per_request() {
    static BUILT: AtomicUsize = AtomicUsize::new(0);
    let adapter = Adapter::api(|| {
        BUILT.fetch_add(1, Ordering::SeqCst);
        Echo::default()
    });

    for _ in 0..3 {
        let mut sink = BufferedSink::new();
        adapter.serve(&mut sink, &get("/echo"), &UriVars::new());
    }

    assert_eq!(BUILT.load(Ordering::SeqCst), 3);
}

struct Home;

impl PageHandler for Home {
    fn get(&mut self, res: &mut PageResponse<'_>, _req: &Request) {
        res.execute_template("home.html", json!({ "name": "World" }));
    }
}

#[test]
fn test_default_group_is_configurable() {
    let adapter = Adapter::page(|| Home, templates()).with_default_group("admin");
    assert_eq!(adapter.family(), "page");

    let mut sink = BufferedSink::new();
    adapter.serve(&mut sink, &get("/"), &UriVars::new());

    assert_eq!(sink.body_text(), "<h1>Admin World</h1>");
}

#[test]
fn test_page_options_ignored_on_api_routes() {
    let adapter = Adapter::api(Echo::default)
        .with_default_group("admin")
        .with_error_template("error.html");
    assert_eq!(adapter.family(), "api");

    let mut sink = BufferedSink::new();
    adapter.serve(&mut sink, &get("/echo"), &UriVars::new());

    assert_eq!(sink.status(), StatusCode::OK);
    assert_eq!(sink.body_text(), "0");
}

/// `/` is a page, `/echo/{id}` an API route.
struct Routes {
    home: Adapter,
    echo: Adapter,
}

impl RouteResolver for Routes {
    fn resolve(&self, path: &str) -> Option<(&dyn Serve, UriVars)> {
        if path == "/" {
            return Some((&self.home, UriVars::new()));
        }
        let id = path.strip_prefix("/echo/")?;
        Some((&self.echo, smallvec![(Arc::from("id"), id.to_string())]))
    }
}

fn service() -> AppService<Routes> {
    AppService::new(Routes {
        home: Adapter::page(|| Home, templates()),
        echo: Adapter::api(Echo::default),
    })
}

#[test]
fn test_service_resolves_routes() {
    let service = service();

    let page = service.handle(&get("/")).unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    assert_eq!(page.body_text(), "<h1>Hello World!</h1>");

    let api = service.handle(&get("/echo/77")).unwrap();
    assert_eq!(api.body_text(), "77");

    assert!(service.handle(&get("/nowhere")).is_none());
}

#[test]
fn test_uri_var_lookup_prefers_last_duplicate() {
    let vars: UriVars = smallvec![
        (Arc::from("id"), "org".to_string()),
        (Arc::from("id"), "user".to_string()),
    ];
    assert_eq!(uri_var(&vars, "id"), Some("user"));
}
