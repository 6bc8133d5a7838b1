//! Error values reported by the dispatch pipeline.
//!
//! None of these ever reach the client as text. Lookup and render failures
//! are answered with an opaque `500`, binding failures are non-fatal. All of
//! them are handed to the adapter's [`ErrorLogger`] exactly once.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use tracing::error;

/// Callback receiving every pipeline error. Shared by all requests of an adapter.
pub type ErrorLogger = Arc<dyn Fn(&PipelineError) + Send + Sync>;

/// Default logger forwarding pipeline errors to `tracing`.
#[must_use]
pub fn tracing_logger() -> ErrorLogger {
    Arc::new(|err: &PipelineError| {
        error!(kind = err.kind(), error = %err, "pipeline error");
    })
}

/// A template group failed to execute a named template.
#[derive(Debug)]
pub struct RenderError {
    template: String,
    cause: Box<dyn Error + Send + Sync>,
}

impl RenderError {
    pub fn new(
        template: impl Into<String>,
        cause: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            template: template.into(),
            cause: cause.into(),
        }
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to render template \"{}\": {}",
            self.template, self.cause
        )
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

/// A URI variable could not be decoded into a handler field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindError {
    /// Name of the URI variable / field
    pub field: String,
    /// Raw value supplied by the router
    pub value: String,
    /// Parser message
    pub reason: String,
}

impl BindError {
    pub fn new(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot bind URI variable \"{}\" from \"{}\": {}",
            self.field, self.value, self.reason
        )
    }
}

impl Error for BindError {}

/// Everything the pipeline reports through its [`ErrorLogger`].
#[derive(Debug)]
pub enum PipelineError {
    /// The response selected a template group that is not registered.
    MissingTemplateGroup {
        /// Group name current at commit time
        group: String,
    },
    /// The selected template (or the error template) failed to render.
    Render(RenderError),
    /// A URI variable failed to decode into an API handler field.
    Binding(BindError),
}

impl PipelineError {
    /// Short stable label used as a structured log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::MissingTemplateGroup { .. } => "missing_template_group",
            PipelineError::Render(_) => "render",
            PipelineError::Binding(_) => "binding",
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::MissingTemplateGroup { group } => {
                write!(f, "no template group named \"{}\"", group)
            }
            PipelineError::Render(err) => fmt::Display::fmt(err, f),
            PipelineError::Binding(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::MissingTemplateGroup { .. } => None,
            PipelineError::Render(err) => Some(err),
            PipelineError::Binding(err) => Some(err),
        }
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        PipelineError::Render(err)
    }
}

impl From<BindError> for PipelineError {
    fn from(err: BindError) -> Self {
        PipelineError::Binding(err)
    }
}
