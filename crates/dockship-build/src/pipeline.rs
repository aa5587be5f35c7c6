use std::path::{Path, PathBuf};

use dockship_core::{DockshipConfig, ProjectFacts, resolve_artifact};
use dockship_engine::{ContainerEngine, EngineError, LogRecord, LogStream};

use crate::render::{DockerfileValues, ManifestRenderer, RenderError};
use crate::staging::{self, StagingError};

/// Dockerfile template name inside the docker source directory.
pub const DOCKERFILE: &str = "Dockerfile";

/// Where the pipeline reads templates from and stages the build context.
#[derive(Debug, Clone)]
pub struct ImageLayout {
    pub source_dir: PathBuf,
    pub context_dir: PathBuf,
}

impl ImageLayout {
    pub fn from_config(project_dir: &Path, config: &DockshipConfig) -> Self {
        Self {
            source_dir: project_dir.join(config.docker.source_dir()),
            context_dir: project_dir.join(config.docker.context_dir(&config.project)),
        }
    }
}

/// Progress of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ContextPrepared,
    DockerfileRendered,
    Built,
    Pushed,
    TaggedAndPushed,
    /// Terminal. Any failed step lands here and later steps refuse to run.
    Failed,
}

/// Drives context staging, Dockerfile rendering, build, push and
/// commit tagging against a [`ContainerEngine`].
pub struct ImagePipeline<'a, C: ContainerEngine> {
    engine: &'a C,
    facts: &'a ProjectFacts,
    layout: ImageLayout,
    renderer: ManifestRenderer,
    stage: Stage,
    staged_artifact: Option<PathBuf>,
}

impl<'a, C: ContainerEngine> ImagePipeline<'a, C> {
    pub fn new(engine: &'a C, facts: &'a ProjectFacts, layout: ImageLayout) -> Self {
        Self {
            engine,
            facts,
            layout,
            renderer: ManifestRenderer::new(),
            stage: Stage::Idle,
            staged_artifact: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn context_dir(&self) -> &Path {
        &self.layout.context_dir
    }

    /// Recreate the build context from the docker source directory and the
    /// single artifact in the dist directory.
    pub fn prepare_context(&mut self) -> Result<PathBuf, PipelineError> {
        self.require(Stage::Idle)?;

        let result = resolve_artifact(self.facts.dist_dir())
            .map_err(|e| PipelineError::Artifact { source: e })
            .and_then(|artifact| {
                staging::prepare_context(
                    &self.layout.source_dir,
                    &self.layout.context_dir,
                    &artifact,
                )
                .map_err(|e| PipelineError::Staging { source: e })
            });

        let staged = self.settle(result, Stage::ContextPrepared)?;
        self.staged_artifact = Some(staged.clone());
        Ok(staged)
    }

    /// Render the Dockerfile template into the build context.
    pub fn render_dockerfile(&mut self) -> Result<PathBuf, PipelineError> {
        self.require(Stage::ContextPrepared)?;

        let package_name = self
            .staged_artifact
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let values = DockerfileValues {
            package_name,
            docker_entry: self.facts.docker_entry().map(str::to_owned),
        };

        let template = self.layout.source_dir.join(DOCKERFILE);
        let result = self
            .renderer
            .render_file(&template, &values)
            .map_err(|e| PipelineError::Render { source: e })
            .and_then(|rendered| {
                tracing::debug!(dockerfile = %rendered, "rendered Dockerfile");
                staging::write_staged(&self.layout.context_dir, Path::new(DOCKERFILE), &rendered)
                    .map_err(|e| PipelineError::Staging { source: e })
            });

        self.settle(result, Stage::DockerfileRendered)
    }

    /// Build the context into the version-tagged image.
    ///
    /// On failure every engine log line is logged before the error returns.
    pub async fn build(&mut self) -> Result<(), PipelineError> {
        self.require(Stage::DockerfileRendered)?;
        let image = self.facts.image_name().to_owned();
        tracing::info!(image = %image, "building image");

        let result = match self.engine.build(&self.layout.context_dir, &image).await {
            Ok(stream) => {
                for record in stream {
                    tracing::debug!("docker build: {}", record.text());
                }
                Ok(())
            }
            Err(EngineError::Build { message, log }) => {
                for line in &log {
                    tracing::error!("docker build: {line}");
                }
                Err(PipelineError::Build {
                    image,
                    message,
                    log,
                })
            }
            Err(e) => Err(PipelineError::Engine { source: e }),
        };

        self.settle(result, Stage::Built)
    }

    /// Push the version-tagged image.
    pub async fn push(&mut self) -> Result<(), PipelineError> {
        self.require(Stage::Built)?;
        let image = self.facts.image_name().to_owned();
        tracing::info!(image = %image, "pushing image");

        let result = match self.engine.push(&image, None).await {
            Ok(stream) => drain_push(&image, stream),
            Err(e) => Err(PipelineError::Engine { source: e }),
        };

        self.settle(result, Stage::Pushed)
    }

    /// Tag the version-tagged image with `short_commit` and push that tag.
    ///
    /// Needs only a locally present version-tagged image, so it may run
    /// without a build in the same process. Returns the commit-pinned name.
    pub async fn tag_and_push(&mut self, short_commit: &str) -> Result<String, PipelineError> {
        self.require_not_failed()?;
        let image = self.facts.image_name().to_owned();
        let target = self.facts.image_name_by_commit(short_commit);

        let result = self.tag_and_push_inner(&image, &target, short_commit).await;
        self.settle(result, Stage::TaggedAndPushed)?;
        Ok(target)
    }

    async fn tag_and_push_inner(
        &self,
        image: &str,
        target: &str,
        short_commit: &str,
    ) -> Result<(), PipelineError> {
        match self.engine.inspect(image).await {
            Ok(info) => tracing::debug!(image, id = %info.id, "found local image"),
            Err(EngineError::ImageNotFound { .. }) => {
                return Err(PipelineError::ImageMissing {
                    image: image.to_owned(),
                });
            }
            Err(e) => return Err(PipelineError::Engine { source: e }),
        }

        tracing::info!(image, target, "tagging image");
        self.engine
            .tag(image, target, true)
            .await
            .map_err(|e| PipelineError::Engine { source: e })?;

        let stream = self
            .engine
            .push(image, Some(short_commit))
            .await
            .map_err(|e| PipelineError::Engine { source: e })?;
        drain_push(target, stream)
    }

    /// Stage the context, render the Dockerfile and build.
    pub async fn package(&mut self) -> Result<(), PipelineError> {
        self.prepare_context()?;
        self.render_dockerfile()?;
        self.build().await
    }

    /// [`package`](Self::package) followed by [`push`](Self::push).
    pub async fn publish(&mut self) -> Result<(), PipelineError> {
        self.package().await?;
        self.push().await
    }

    fn require(&self, expected: Stage) -> Result<(), PipelineError> {
        self.require_not_failed()?;
        if self.stage == expected {
            Ok(())
        } else {
            Err(PipelineError::OutOfOrder {
                expected,
                actual: self.stage,
            })
        }
    }

    fn require_not_failed(&self) -> Result<(), PipelineError> {
        if self.stage == Stage::Failed {
            Err(PipelineError::AlreadyFailed)
        } else {
            Ok(())
        }
    }

    fn settle<T>(
        &mut self,
        result: Result<T, PipelineError>,
        next: Stage,
    ) -> Result<T, PipelineError> {
        self.stage = if result.is_ok() { next } else { Stage::Failed };
        result
    }
}

/// Consume the whole push stream, failing on the first in-band error.
fn drain_push(image: &str, stream: LogStream) -> Result<(), PipelineError> {
    let mut first_error = None;
    for record in stream {
        match record {
            LogRecord::Status(status) => tracing::debug!("docker push: {status}"),
            LogRecord::Error(message) => {
                tracing::error!("docker push: {message}");
                first_error.get_or_insert(message);
            }
        }
    }

    match first_error {
        Some(message) => Err(PipelineError::Push {
            image: image.to_owned(),
            message,
        }),
        None => Ok(()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to locate build artifact")]
    Artifact { source: dockship_core::Error },

    #[error("failed to stage build context")]
    Staging { source: StagingError },

    #[error("failed to render Dockerfile")]
    Render { source: RenderError },

    #[error("failed to build image {image}: {message}")]
    Build {
        image: String,
        message: String,
        log: Vec<String>,
    },

    #[error("failed to push image {image}: {message}")]
    Push { image: String, message: String },

    #[error("image {image} not found locally; build it first")]
    ImageMissing { image: String },

    #[error("container engine error")]
    Engine { source: EngineError },

    #[error("pipeline step out of order: expected {expected:?}, at {actual:?}")]
    OutOfOrder { expected: Stage, actual: Stage },

    #[error("pipeline already failed")]
    AlreadyFailed,
}
