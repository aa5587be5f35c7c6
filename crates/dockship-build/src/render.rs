use std::path::{Path, PathBuf};

use dockship_core::{ConfigMap, ProjectFacts};
use handlebars::Handlebars;
use serde::Serialize;

/// Renders Dockerfile and manifest templates.
///
/// Rendering is strict: a reference to an undefined value fails instead of
/// expanding to an empty string. Output is not HTML-escaped.
pub struct ManifestRenderer {
    handlebars: Handlebars<'static>,
}

impl ManifestRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Render `template` against `context`. `source` names the template in errors.
    pub fn render<T: Serialize>(
        &self,
        source: &Path,
        template: &str,
        context: &T,
    ) -> Result<String, RenderError> {
        self.handlebars
            .render_template(template, context)
            .map_err(|e| RenderError::Template {
                path: source.to_path_buf(),
                source: Box::new(e),
            })
    }

    /// Read the template at `path` and render it.
    pub fn render_file<T: Serialize>(&self, path: &Path, context: &T) -> Result<String, RenderError> {
        let template = std::fs::read_to_string(path).map_err(|e| RenderError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.render(path, &template, context)
    }
}

impl Default for ManifestRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Values available to manifest templates as `project.*` and `user.*`.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    pub project: ProjectValues,
    pub user: ConfigMap,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectValues {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub image_name: String,
    /// Branch and full commit of the working copy, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl TemplateContext {
    /// `image_name` is the reference manifests should run, normally the
    /// commit-pinned one.
    pub fn new(facts: &ProjectFacts, image_name: impl Into<String>, user: ConfigMap) -> Self {
        Self {
            project: ProjectValues {
                name: facts.name().to_owned(),
                version: facts.version().to_owned(),
                namespace: facts.namespace().map(str::to_owned),
                image_name: image_name.into(),
                branch: facts.revision().map(|r| r.branch.clone()),
                commit: facts.revision().map(|r| r.commit.clone()),
            },
            user,
        }
    }
}

/// Values available to the Dockerfile template.
#[derive(Debug, Clone, Serialize)]
pub struct DockerfileValues {
    /// File name of the artifact copied into the build context
    pub package_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_entry: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to read template {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to render template {path}")]
    Template {
        path: PathBuf,
        source: Box<handlebars::RenderError>,
    },
}

impl RenderError {
    pub fn path(&self) -> &Path {
        match self {
            RenderError::Read { path, .. } | RenderError::Template { path, .. } => path,
        }
    }
}
