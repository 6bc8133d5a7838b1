#![allow(dead_code)]

use http::StatusCode;
use portico::api::{Api, DeferredWriter};
use portico::error::{ErrorLogger, PipelineError};
use portico::interceptor::Interceptor;
use portico::page::{Page, PageResponse};
use portico::server::{build_request, Request};
use portico::templates::{MiniJinjaGroup, TemplateGroupSet};
use serde_json::json;
use std::sync::{Arc, Mutex};

pub mod tracing_util {
    use tracing::subscriber::DefaultGuard;

    /// Thread-local subscriber so `debug!` paths are exercised in tests.
    pub struct TestTracing {
        _guard: DefaultGuard,
    }

    impl TestTracing {
        pub fn init() -> Self {
            let subscriber = tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(tracing::Level::DEBUG)
                .finish();
            Self {
                _guard: tracing::subscriber::set_default(subscriber),
            }
        }
    }
}

/// Shared event log written by [`Recorder`]s and test handlers.
pub type Events = Arc<Mutex<Vec<String>>>;

pub fn events() -> Events {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn take(events: &Events) -> Vec<String> {
    std::mem::take(&mut *events.lock().unwrap())
}

/// What a [`Recorder`] does in its `before` hook besides recording.
#[derive(Clone)]
pub enum Action {
    Nothing,
    Redirect(&'static str, StatusCode),
    Template(&'static str),
    Group(&'static str),
    Status(StatusCode),
    Body(&'static [u8]),
}

/// Interceptor that logs `before:<name>` / `after:<name>` and optionally acts.
pub struct Recorder {
    name: &'static str,
    action: Action,
    events: Events,
}

impl Recorder {
    pub fn new(name: &'static str, events: &Events) -> Self {
        Self::acting(name, Action::Nothing, events)
    }

    pub fn acting(name: &'static str, action: Action, events: &Events) -> Self {
        Self {
            name,
            action,
            events: Arc::clone(events),
        }
    }

    fn push(&self, phase: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("{phase}:{}", self.name));
    }
}

impl Interceptor<Page> for Recorder {
    fn before(&self, res: &mut PageResponse<'_>, _req: &Request) {
        self.push("before");
        match &self.action {
            Action::Redirect(url, status) => res.redirect(*url, *status),
            Action::Template(name) => res.execute_template(name, json!({ "name": self.name })),
            Action::Group(group) => res.set_template_group(*group),
            _ => {}
        }
    }

    fn after(&self, _res: &mut PageResponse<'_>, _req: &Request) {
        self.push("after");
    }
}

impl Interceptor<Api> for Recorder {
    fn before(&self, w: &mut DeferredWriter<'_>, _req: &Request) {
        self.push("before");
        match &self.action {
            Action::Status(status) => w.write_header(*status),
            Action::Body(bytes) => {
                w.write_body(bytes).unwrap();
            }
            _ => {}
        }
    }

    fn after(&self, _res: &mut DeferredWriter<'_>, _req: &Request) {
        self.push("after");
    }
}

/// Logger capturing every reported pipeline error as `<kind>: <message>`.
pub fn capture_logger() -> (ErrorLogger, Events) {
    let captured = events();
    let sink = Arc::clone(&captured);
    let logger: ErrorLogger = Arc::new(move |err: &PipelineError| {
        sink.lock()
            .unwrap()
            .push(format!("{}: {}", err.kind(), err));
    });
    (logger, captured)
}

/// Groups `default` and `admin`.
///
/// `broken.html` compiles but fails at render time because its include is
/// missing.
pub fn templates() -> Arc<TemplateGroupSet> {
    let default = MiniJinjaGroup::from_sources([
        ("home.html", "<h1>Hello {{ name }}!</h1>"),
        ("broken.html", "{% include \"missing.html\" %}"),
        ("error.html", "<p>error {{ status }} in {{ template }}</p>"),
        ("bad_error.html", "{% include \"also_missing.html\" %}"),
    ])
    .unwrap();
    let admin = MiniJinjaGroup::from_sources([("home.html", "<h1>Admin {{ name }}</h1>")]).unwrap();
    Arc::new(
        TemplateGroupSet::new()
            .with("default", default)
            .with("admin", admin),
    )
}

pub fn request(method: &str, uri: &str) -> Request {
    build_request(method, uri, Vec::new()).unwrap()
}

pub fn get(uri: &str) -> Request {
    request("GET", uri)
}
