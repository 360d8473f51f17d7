//! Template Store - Persisted Template JSON
//!
//! Synthesized templates are persisted as plain JSON; the rendering contract
//! is reconstructed from the data on load. Loading enforces engine version
//! compatibility.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::pipeline::PipelineError;
use crate::template::Template;
use crate::ENGINE_VERSION;

/// Default filename for a downloaded template export.
pub const EXPORT_FILENAME: &str = "recreated-competitor-template.json";

/// Check that this engine is new enough to render the template.
pub fn check_engine_version(template: &Template) -> Result<(), PipelineError> {
    let engine_ver = semver::Version::parse(ENGINE_VERSION)
        .map_err(|_| PipelineError::RenderContext("invalid engine version".into()))?;
    let min_ver = semver::Version::parse(&template.engine_min_version)
        .map_err(|_| PipelineError::RenderContext("invalid template min version".into()))?;

    if engine_ver < min_ver {
        return Err(PipelineError::EngineVersionMismatch(
            template.template_version.clone(),
            template.engine_min_version.clone(),
            ENGINE_VERSION.to_string(),
        ));
    }
    Ok(())
}

/// In-memory collection of persisted templates, keyed by id.
pub struct TemplateStore {
    templates: HashMap<String, Template>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self { templates: HashMap::new() }
    }

    /// Load every parseable `*.json` template in a directory. Unparseable
    /// or version-incompatible files are skipped with a warning; version
    /// compatibility is re-checked at render time.
    pub fn load_from_dir(dir: &Path) -> Result<Self, PipelineError> {
        let mut store = Self::new();
        if dir.exists() {
            for entry in fs::read_dir(dir).map_err(io_error)? {
                let entry = entry.map_err(io_error)?;
                let path = entry.path();
                if path.extension().map_or(false, |e| e == "json") {
                    if let Ok(content) = fs::read_to_string(&path) {
                        if let Ok(template) = serde_json::from_str::<Template>(&content) {
                            if let Err(err) = check_engine_version(&template) {
                                tracing::warn!(
                                    %err,
                                    path = %path.display(),
                                    "skipping incompatible template"
                                );
                                continue;
                            }
                            store.templates.insert(template.id.clone(), template);
                        }
                    }
                }
            }
        }
        Ok(store)
    }

    /// Write one template as pretty JSON to `dir/<id>.json` and register it.
    /// Each template gets its own file; saving never clobbers a sibling.
    pub fn save(&mut self, dir: &Path, template: &Template) -> Result<(), PipelineError> {
        fs::create_dir_all(dir).map_err(io_error)?;
        let json = serde_json::to_string_pretty(template)?;
        fs::write(dir.join(format!("{}.json", template.id)), json).map_err(io_error)?;
        self.templates.insert(template.id.clone(), template.clone());
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    pub fn list(&self) -> Vec<&Template> {
        self.templates.values().collect()
    }

    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.id.clone(), template);
    }
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Write one template as the single-file download artifact
/// `dir/<EXPORT_FILENAME>`, overwriting any previous export.
pub fn export_template(dir: &Path, template: &Template) -> Result<std::path::PathBuf, PipelineError> {
    fs::create_dir_all(dir).map_err(io_error)?;
    let json = serde_json::to_string_pretty(template)?;
    let path = dir.join(EXPORT_FILENAME);
    fs::write(&path, json).map_err(io_error)?;
    Ok(path)
}

fn io_error(err: std::io::Error) -> PipelineError {
    PipelineError::RenderContext(format!("template store I/O: {err}"))
}
