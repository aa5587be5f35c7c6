pub mod pipeline;
pub mod render;
pub mod staging;

pub use pipeline::{ImageLayout, ImagePipeline, PipelineError, Stage};
pub use render::{DockerfileValues, ManifestRenderer, ProjectValues, RenderError, TemplateContext};
pub use staging::StagingError;
