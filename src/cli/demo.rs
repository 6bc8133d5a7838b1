use std::sync::Arc;

use anyhow::Context;
use http::header::HeaderName;
use http::{HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use smallvec::smallvec;
use tracing::{debug, warn};

use crate::api::{Api, DeferredWriter};
use crate::binding::{Binder, UriVars};
use crate::dispatcher::{Adapter, Serve};
use crate::handler::{ApiHandler, PageHandler};
use crate::interceptor::{InterceptorChain, RequireHeader, TracingInterceptor};
use crate::page::{Page, PageResponse};
use crate::runtime_config::RuntimeConfig;
use crate::server::{Request, RouteResolver};
use crate::templates::{MiniJinjaGroup, TemplateGroupSet};

const DEMO_TOKEN_HEADER: &str = "x-demo-token";
const DEMO_TOKEN: &str = "letmein";

/// Templates used by the demo pages, registered as group `group`.
///
/// # Errors
///
/// Returns the template syntax error, if any.
pub fn demo_templates(group: &str) -> Result<TemplateGroupSet, minijinja::Error> {
    let templates = MiniJinjaGroup::from_sources([
        (
            "home.html",
            "<!doctype html><h1>Hello {{ name }}!</h1><form method=\"post\"><button>Again</button></form>",
        ),
        ("account.html", "<!doctype html><h1>Account</h1><p>Signed in.</p>"),
        ("login.html", "<!doctype html><h1>Please sign in</h1>"),
        ("error.html", "<!doctype html><h1>Error {{ status }}</h1>"),
    ])?;
    Ok(TemplateGroupSet::new().with(group, templates))
}

struct HomePage;

impl PageHandler for HomePage {
    fn interceptors(&self) -> InterceptorChain<Page> {
        InterceptorChain::new().with(TracingInterceptor::new())
    }

    fn get(&mut self, res: &mut PageResponse<'_>, req: &Request) {
        let name = req
            .uri()
            .query()
            .and_then(|q| q.split('&').find_map(|kv| kv.strip_prefix("name=")))
            .unwrap_or("visitor");
        res.execute_template("pages/home.html", json!({ "name": name }));
    }

    fn post(&mut self, res: &mut PageResponse<'_>, _req: &Request) {
        res.redirect("/", StatusCode::SEE_OTHER);
    }
}

struct LoginPage;

impl PageHandler for LoginPage {
    fn get(&mut self, res: &mut PageResponse<'_>, _req: &Request) {
        res.execute_template("login.html", json!({}));
    }
}

struct AccountPage;

impl PageHandler for AccountPage {
    fn interceptors(&self) -> InterceptorChain<Page> {
        InterceptorChain::new()
            .with(TracingInterceptor::new())
            .with(token_guard())
    }

    fn get(&mut self, res: &mut PageResponse<'_>, _req: &Request) {
        if let Ok(cookie) = HeaderValue::from_str("seen=1; Path=/; HttpOnly") {
            res.set_cookie(cookie);
        }
        res.execute_template("account.html", json!({}));
    }
}

#[derive(Default)]
struct ItemsApi {
    id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Item {
    #[serde(default)]
    id: u64,
    name: String,
}

impl ApiHandler for ItemsApi {
    fn interceptors(&self) -> InterceptorChain<Api> {
        InterceptorChain::new().with(TracingInterceptor::new())
    }

    fn bind(&mut self, binder: &mut Binder<'_>) {
        binder.field("id", &mut self.id);
    }

    fn get(&mut self, w: &mut DeferredWriter<'_>, _req: &Request) {
        if self.id == 0 {
            w.write_header(StatusCode::NOT_FOUND);
            return;
        }
        let item = Item {
            id: self.id,
            name: format!("item-{}", self.id),
        };
        write_json(w, &item);
    }

    fn put(&mut self, w: &mut DeferredWriter<'_>, req: &Request) {
        if self.id == 0 {
            w.write_header(StatusCode::NOT_FOUND);
            return;
        }
        match serde_json::from_slice::<Item>(req.body()) {
            Ok(mut item) => {
                item.id = self.id;
                write_json(w, &item);
            }
            Err(err) => {
                debug!(error = %err, "Rejecting item body");
                w.write_header(StatusCode::BAD_REQUEST);
            }
        }
    }

    fn delete(&mut self, w: &mut DeferredWriter<'_>, _req: &Request) {
        w.write_header(StatusCode::NO_CONTENT);
    }
}

fn write_json<T: Serialize>(w: &mut DeferredWriter<'_>, value: &T) {
    w.headers_mut().insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    if let Err(err) = serde_json::to_writer(w, value) {
        warn!(error = %err, "Failed to write JSON body");
    }
}

fn token_guard() -> RequireHeader {
    RequireHeader::new(
        HeaderName::from_static(DEMO_TOKEN_HEADER),
        HeaderValue::from_static(DEMO_TOKEN),
    )
    .login_url("login")
}

/// Fixed route table of the demo service.
pub struct DemoRoutes {
    home: Adapter,
    login: Adapter,
    account: Adapter,
    items: Adapter,
}

impl DemoRoutes {
    /// # Errors
    ///
    /// Returns an error when the demo templates fail to compile.
    pub fn new(config: &RuntimeConfig) -> anyhow::Result<Self> {
        let templates = Arc::new(
            demo_templates(&config.template_group).context("Demo templates do not compile")?,
        );
        let page = |adapter: Adapter| {
            let adapter = adapter.with_default_group(config.template_group.as_str());
            match &config.error_template {
                Some(name) => adapter.with_error_template(name.as_str()),
                None => adapter,
            }
        };
        Ok(Self {
            home: page(Adapter::page(|| HomePage, Arc::clone(&templates))),
            login: page(Adapter::page(|| LoginPage, Arc::clone(&templates))),
            account: page(Adapter::page(|| AccountPage, Arc::clone(&templates))),
            items: Adapter::api(ItemsApi::default),
        })
    }
}

impl RouteResolver for DemoRoutes {
    fn resolve(&self, path: &str) -> Option<(&dyn Serve, UriVars)> {
        match path {
            "/" => Some((&self.home, UriVars::new())),
            "/login" => Some((&self.login, UriVars::new())),
            "/account" => Some((&self.account, UriVars::new())),
            _ => {
                let id = path.strip_prefix("/api/items/")?;
                if id.is_empty() || id.contains('/') {
                    return None;
                }
                Some((&self.items, smallvec![(Arc::from("id"), id.to_string())]))
            }
        }
    }
}
