//! Page family: handlers decide on a redirect or a template, and the decision
//! is only turned into bytes once the whole interceptor chain has run.

use http::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
use http::{HeaderValue, Method, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{ErrorLogger, PipelineError};
use crate::interceptor::{Family, ShortCircuit};
use crate::server::{Request, ResponseSink};
use crate::templates::{TemplateGroup, TemplateGroupSet};

/// Template group selected until a handler or interceptor picks another.
pub const DEFAULT_TEMPLATE_GROUP: &str = "default";

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Marker for the page-rendering handler family.
pub struct Page;

impl Family for Page {
    type Response<'a> = PageResponse<'a>;
    const NAME: &'static str = "page";
}

/// Collaborators consulted when a page response commits.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub templates: &'a TemplateGroupSet,
    /// Rendered in place of a template that failed; status stays 500.
    pub error_template: Option<&'a str>,
    pub logger: &'a ErrorLogger,
}

/// Template chosen by `execute_template`, already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSelection {
    pub name: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub url: String,
    pub status: StatusCode,
}

/// Deferred response of a page handler.
///
/// `redirect` and `execute_template` only record a decision and mark the
/// response committed, which short-circuits the remaining `before` hooks.
/// Nothing reaches the sink until [`PageResponse::commit`], except cookies.
pub struct PageResponse<'a> {
    sink: &'a mut dyn ResponseSink,
    request: &'a Request,
    ctx: RenderContext<'a>,
    template_group: String,
    redirect: Option<RedirectTarget>,
    template: Option<TemplateSelection>,
    fixed_status: Option<StatusCode>,
    committed: bool,
}

impl<'a> PageResponse<'a> {
    pub fn new(
        sink: &'a mut dyn ResponseSink,
        request: &'a Request,
        ctx: RenderContext<'a>,
    ) -> Self {
        Self {
            sink,
            request,
            ctx,
            template_group: DEFAULT_TEMPLATE_GROUP.to_string(),
            redirect: None,
            template: None,
            fixed_status: None,
            committed: false,
        }
    }

    /// Select the template group used at commit; the last call wins.
    pub fn set_template_group(&mut self, name: impl Into<String>) {
        self.template_group = name.into();
    }

    #[must_use]
    pub fn template_group(&self) -> &str {
        &self.template_group
    }

    /// Decide on a redirect to `url` with `status`.
    pub fn redirect(&mut self, url: impl Into<String>, status: StatusCode) {
        self.committed = true;
        self.redirect = Some(RedirectTarget {
            url: url.into(),
            status,
        });
    }

    /// Decide on rendering template `name` with `data`.
    ///
    /// Only the final `/`-separated segment of `name` identifies the template,
    /// so `"pages/home.html"` and `"home.html"` select the same one.
    pub fn execute_template(&mut self, name: &str, data: Value) {
        self.committed = true;
        self.template = Some(TemplateSelection {
            name: template_identifier(name).to_string(),
            data,
        });
    }

    /// Append a pre-encoded `Set-Cookie` header to the sink right away.
    pub fn set_cookie(&mut self, cookie: HeaderValue) {
        self.sink.headers_mut().append(SET_COOKIE, cookie);
    }

    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    #[must_use]
    pub fn redirect_target(&self) -> Option<&RedirectTarget> {
        self.redirect.as_ref()
    }

    #[must_use]
    pub fn template_selection(&self) -> Option<&TemplateSelection> {
        self.template.as_ref()
    }

    /// Answer with a bare status regardless of later decisions.
    pub(crate) fn reject(&mut self, status: StatusCode) {
        self.fixed_status = Some(status);
    }

    /// Turn the accumulated decision into the actual response.
    ///
    /// An undecided response is answered with 500. A redirect wins over a
    /// template selection. Template lookup and render failures are reported
    /// to the logger and answered with 500.
    pub fn commit(self) {
        let PageResponse {
            sink,
            request,
            ctx,
            template_group,
            redirect,
            template,
            fixed_status,
            committed,
        } = self;

        if let Some(status) = fixed_status {
            sink.write_head(status);
            return;
        }

        if !committed {
            warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "Page handler made no response decision"
            );
            sink.write_head(StatusCode::INTERNAL_SERVER_ERROR);
            return;
        }

        if let Some(target) = redirect {
            write_redirect(sink, request, &target.url, target.status);
            return;
        }

        match template {
            Some(selection) => render_selection(sink, ctx, &template_group, &selection),
            None => sink.write_head(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl ShortCircuit for PageResponse<'_> {
    fn should_short_circuit(&self) -> bool {
        self.committed
    }
}

fn template_identifier(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn render_selection(
    sink: &mut dyn ResponseSink,
    ctx: RenderContext<'_>,
    group_name: &str,
    selection: &TemplateSelection,
) {
    let Some(group) = ctx.templates.get(group_name) else {
        (ctx.logger)(&PipelineError::MissingTemplateGroup {
            group: group_name.to_string(),
        });
        sink.write_head(StatusCode::INTERNAL_SERVER_ERROR);
        return;
    };

    let mut body = Vec::new();
    match group.execute(&mut body, &selection.name, &selection.data) {
        Ok(()) => {
            debug!(
                group = group_name,
                template = %selection.name,
                bytes = body.len(),
                "Template rendered"
            );
            send_html(sink, StatusCode::OK, &body);
        }
        Err(err) => {
            (ctx.logger)(&PipelineError::Render(err));
            render_error_template(sink, ctx, group, &selection.name);
        }
    }
}

fn render_error_template(
    sink: &mut dyn ResponseSink,
    ctx: RenderContext<'_>,
    group: &dyn TemplateGroup,
    failed: &str,
) {
    if let Some(error_template) = ctx.error_template.filter(|t| *t != failed) {
        let mut body = Vec::new();
        let data = json!({ "status": 500, "template": failed });
        match group.execute(&mut body, error_template, &data) {
            Ok(()) => {
                send_html(sink, StatusCode::INTERNAL_SERVER_ERROR, &body);
                return;
            }
            Err(err) => (ctx.logger)(&PipelineError::Render(err)),
        }
    }
    sink.write_head(StatusCode::INTERNAL_SERVER_ERROR);
}

fn send_html(sink: &mut dyn ResponseSink, status: StatusCode, body: &[u8]) {
    if !sink.headers().contains_key(CONTENT_TYPE) {
        sink.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    }
    sink.write_head(status);
    if let Err(err) = sink.write_body(body) {
        warn!(error = %err, "Failed to write page body");
    }
}

fn write_redirect(sink: &mut dyn ResponseSink, request: &Request, url: &str, status: StatusCode) {
    let location = resolve_location(request.uri().path(), url);
    match HeaderValue::from_str(&location) {
        Ok(value) => {
            sink.headers_mut().insert(LOCATION, value);
        }
        Err(err) => {
            warn!(
                location = %location,
                error = %err,
                "Redirect target is not a valid header value"
            );
            sink.write_head(StatusCode::INTERNAL_SERVER_ERROR);
            return;
        }
    }

    let method = request.method();
    let preset_type = sink.headers().contains_key(CONTENT_TYPE);
    if !preset_type && (*method == Method::GET || *method == Method::HEAD) {
        sink.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    }
    sink.write_head(status);

    if !preset_type && *method == Method::GET {
        let body = format!(
            "<a href=\"{}\">{}</a>.\n",
            escape_html(&location),
            status.canonical_reason().unwrap_or_default()
        );
        if let Err(err) = sink.write_body(body.as_bytes()) {
            warn!(error = %err, "Failed to write redirect body");
        }
    }
}

/// Resolve a redirect target against the path of the current request.
///
/// Absolute URLs and scheme-relative targets pass through; anything else is
/// joined onto the request path the way a browser would.
fn resolve_location(request_path: &str, target: &str) -> String {
    if target.starts_with("//") || url::Url::parse(target).is_ok() {
        return target.to_string();
    }
    let resolved = url::Url::parse("http://localhost/")
        .and_then(|base| base.join(request_path))
        .and_then(|base| base.join(target));
    match resolved {
        Ok(u) => {
            let mut out = u.path().to_string();
            if let Some(query) = u.query() {
                out.push('?');
                out.push_str(query);
            }
            if let Some(fragment) = u.fragment() {
                out.push('#');
                out.push_str(fragment);
            }
            out
        }
        Err(_) => target.to_string(),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
