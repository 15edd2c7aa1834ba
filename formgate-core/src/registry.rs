use crate::error::GateError;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Files must carry this suffix to become a route.
const TEMPLATE_SUFFIX: &str = ".tpl";

/// Compiled message templates, one route per template file.
///
/// Scans a directory once at startup; the mapping is immutable for the
/// process lifetime (no hot reload) and therefore safe to share across
/// request tasks without synchronization. Route names are the template
/// file stem prefixed with `/`, e.g. `contact.tpl` → `/contact`.
#[derive(Debug)]
pub struct TemplateRegistry {
    engine: Handlebars<'static>,
}

impl TemplateRegistry {
    /// Load every `*.tpl` file in `dir` (non-recursive).
    ///
    /// Non-template files and subdirectories are skipped with a diagnostic.
    /// Fails if the directory cannot be listed, a template file cannot be
    /// read, or a template body fails to compile.
    pub fn load(dir: &Path) -> Result<Self, GateError> {
        let mut engine = Handlebars::new();
        // Messages go to a chat channel, not a browser.
        engine.register_escape_fn(handlebars::no_escape);

        let entries = std::fs::read_dir(dir).map_err(|e| {
            GateError::TemplateLoad(format!("unable to list {}: {e}", dir.display()))
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| {
                GateError::TemplateLoad(format!("unable to list {}: {e}", dir.display()))
            })?;
            let path = entry.path();
            let stem = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(TEMPLATE_SUFFIX));

            match stem {
                Some(stem) if path.is_file() => {
                    let name = format!("/{stem}");
                    let body = std::fs::read_to_string(&path).map_err(|e| {
                        GateError::TemplateLoad(format!("unable to read {}: {e}", path.display()))
                    })?;
                    engine.register_template_string(&name, &body).map_err(|e| {
                        GateError::TemplateLoad(format!("unable to parse {}: {e}", path.display()))
                    })?;
                    debug!(route = %name, file = %path.display(), "template registered");
                }
                _ => {
                    debug!(file = %path.display(), "ignored file or directory");
                }
            }
        }

        let registry = Self { engine };
        info!(dir = %dir.display(), routes = registry.len(), "templates loaded");
        Ok(registry)
    }

    /// Exact-match route lookup.
    pub fn contains(&self, name: &str) -> bool {
        self.engine.has_template(name)
    }

    /// Render the named template against the submitted values.
    ///
    /// Absent fields render as empty text (non-strict mode).
    pub fn render<T: Serialize>(&self, name: &str, values: &T) -> Result<String, GateError> {
        self.engine
            .render(name, values)
            .map_err(|e| GateError::Render(e.to_string()))
    }

    /// Registered route names, sorted.
    pub fn route_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engine.get_templates().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.engine.get_templates().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
