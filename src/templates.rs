//! Template groups consulted by page responses at commit time.
//!
//! A group is a named, already compiled bundle of templates. Compilation and
//! loading happen at startup; the pipeline only looks groups up by name and
//! asks them to execute one template.

use minijinja::Environment;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::error::RenderError;

/// A renderable bundle of templates.
pub trait TemplateGroup: Send + Sync {
    /// Execute template `name` with `data`, writing the output to `out`.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] when the template is unknown or fails.
    fn execute(&self, out: &mut dyn Write, name: &str, data: &Value) -> Result<(), RenderError>;
}

/// Mapping from group name to template group.
#[derive(Clone, Default)]
pub struct TemplateGroupSet {
    groups: HashMap<String, Arc<dyn TemplateGroup>>,
}

impl TemplateGroupSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `group` under `name`, returning the group it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        group: impl TemplateGroup + 'static,
    ) -> Option<Arc<dyn TemplateGroup>> {
        self.groups.insert(name.into(), Arc::new(group))
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, group: impl TemplateGroup + 'static) -> Self {
        self.insert(name, group);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn TemplateGroup> {
        self.groups.get(name).map(|g| g.as_ref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl fmt::Debug for TemplateGroupSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.groups.keys().collect();
        names.sort();
        f.debug_struct("TemplateGroupSet")
            .field("groups", &names)
            .finish()
    }
}

/// [`TemplateGroup`] backed by a `minijinja` environment.
#[derive(Debug)]
pub struct MiniJinjaGroup {
    env: Environment<'static>,
}

impl Default for MiniJinjaGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl MiniJinjaGroup {
    #[must_use]
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Build a group from `(name, source)` pairs.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error encountered.
    pub fn from_sources<I, N, S>(sources: I) -> Result<Self, minijinja::Error>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut group = Self::new();
        for (name, source) in sources {
            group.add_template(name, source)?;
        }
        Ok(group)
    }

    /// Compile and register one template.
    ///
    /// # Errors
    ///
    /// Returns the syntax error if `source` does not compile.
    pub fn add_template(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), minijinja::Error> {
        self.env.add_template_owned(name.into(), source.into())
    }
}

impl TemplateGroup for MiniJinjaGroup {
    fn execute(&self, out: &mut dyn Write, name: &str, data: &Value) -> Result<(), RenderError> {
        let tmpl = self
            .env
            .get_template(name)
            .map_err(|e| RenderError::new(name, e))?;
        tmpl.render_to_write(data, out)
            .map(|_| ())
            .map_err(|e| RenderError::new(name, e))
    }
}
