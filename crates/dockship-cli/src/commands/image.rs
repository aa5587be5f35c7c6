use std::path::Path;

use anyhow::Context;
use dockship_build::{ImageLayout, ImagePipeline};
use dockship_engine::{ContainerEngine, DockerCli};

use super::Project;

/// Build the version-tagged image.
pub async fn package(dir: &Path) -> anyhow::Result<()> {
    let project = Project::load(dir)?;
    let docker = connect().await?;
    let mut pipeline = pipeline(&docker, &project);

    pipeline.package().await?;
    println!("Built {}", project.facts.image_name());
    Ok(())
}

/// Build and push the version-tagged image, then push it under the commit tag.
pub async fn publish(dir: &Path) -> anyhow::Result<()> {
    let project = Project::load(dir)?;
    let short = project.resolver.short_commit()?;
    let docker = connect().await?;
    let mut pipeline = pipeline(&docker, &project);

    pipeline.publish().await?;
    println!("Pushed {}", project.facts.image_name());

    let target = pipeline.tag_and_push(&short).await?;
    println!("Pushed {target}");
    Ok(())
}

/// Push the commit tag of an image built earlier.
pub async fn tag(dir: &Path) -> anyhow::Result<()> {
    let project = Project::load(dir)?;
    let short = project.resolver.short_commit()?;
    let docker = connect().await?;
    let mut pipeline = pipeline(&docker, &project);

    let target = pipeline.tag_and_push(&short).await?;
    println!("Pushed {target}");
    Ok(())
}

async fn connect() -> anyhow::Result<DockerCli> {
    let docker = DockerCli::new();
    let version = docker
        .version()
        .await
        .context("docker engine is not reachable; run `dockship doctor`")?;
    tracing::debug!(version = %version, "docker engine available");
    Ok(docker)
}

fn pipeline<'a>(docker: &'a DockerCli, project: &'a Project) -> ImagePipeline<'a, DockerCli> {
    ImagePipeline::new(
        docker,
        &project.facts,
        ImageLayout::from_config(&project.dir, &project.config),
    )
}
