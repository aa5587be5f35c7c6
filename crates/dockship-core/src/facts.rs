use std::path::{Path, PathBuf};

use crate::naming::{self, VersionSource};
use crate::{CargoProject, DockshipConfig, RevisionInfo, RevisionResolver};

/// Everything the pipeline knows about the project, fixed for one run.
///
/// The version-tagged image name is derived once at construction; builder
/// methods that change its inputs derive it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFacts {
    name: String,
    version: String,
    dist_dir: PathBuf,
    tag_prefix: String,
    docker_version: Option<String>,
    docker_entry: Option<String>,
    namespace: Option<String>,
    revision: Option<RevisionInfo>,
    image_name: String,
}

impl ProjectFacts {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        tag_prefix: impl Into<String>,
    ) -> Self {
        let mut facts = Self {
            name: name.into(),
            version: version.into(),
            dist_dir: PathBuf::from("target/dist"),
            tag_prefix: tag_prefix.into(),
            docker_version: None,
            docker_entry: None,
            namespace: None,
            revision: None,
            image_name: String::new(),
        };
        facts.derive_image_name();
        facts
    }

    /// Assemble facts from `dockship.toml`, falling back to Cargo metadata for
    /// the project name, version and entry binary.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingSetting`](crate::Error::MissingSetting) if `docker.tag_prefix` is unset
    /// - Cargo discovery errors when name or version must come from Cargo
    pub fn resolve(
        project_dir: &Path,
        config: &DockshipConfig,
        revision: Option<RevisionInfo>,
    ) -> crate::Result<Self> {
        let tag_prefix = config
            .docker
            .tag_prefix
            .clone()
            .ok_or(crate::Error::MissingSetting {
                key: "docker.tag_prefix",
            })?;

        let cargo = if config.project.name.is_none() || config.project.version.is_none() {
            Some(CargoProject::discover(project_dir)?)
        } else {
            None
        };

        let pick = |configured: &Option<String>, from_cargo: fn(&CargoProject) -> String| {
            configured
                .clone()
                .or_else(|| cargo.as_ref().map(from_cargo))
                .unwrap_or_default()
        };
        let name = pick(&config.project.name, |c| c.name.clone());
        let version = pick(&config.project.version, |c| c.version.clone());
        let entry = config
            .docker
            .entry
            .clone()
            .or_else(|| cargo.as_ref().and_then(|c| c.default_binary.clone()));

        let facts = Self::new(name, version, tag_prefix)
            .with_dist_dir(project_dir.join(&config.project.dist_dir))
            .with_docker_version(config.docker.version.clone())
            .with_docker_entry(entry)
            .with_namespace(config.kubernetes.namespace.clone())
            .with_revision(revision);

        tracing::debug!(
            name = %facts.name,
            version = %facts.version,
            image = %facts.image_name,
            "project facts resolved"
        );
        if let Some(rev) = &facts.revision {
            tracing::debug!(
                commit = %rev.short_commit,
                branch = %rev.branch,
                tags = ?rev.tags,
                "working copy revision"
            );
        }

        Ok(facts)
    }

    pub fn with_dist_dir(mut self, dist_dir: impl Into<PathBuf>) -> Self {
        self.dist_dir = dist_dir.into();
        self
    }

    pub fn with_docker_version(mut self, docker_version: Option<String>) -> Self {
        self.docker_version = docker_version;
        self.derive_image_name();
        self
    }

    pub fn with_docker_entry(mut self, entry: Option<String>) -> Self {
        self.docker_entry = entry;
        self
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_revision(mut self, revision: Option<RevisionInfo>) -> Self {
        self.revision = revision;
        self
    }

    fn derive_image_name(&mut self) {
        self.image_name = naming::image_name(&self.tag_prefix, &self.name, self.version_source());
    }

    fn version_source(&self) -> VersionSource<'_> {
        VersionSource {
            docker_version: self.docker_version.as_deref(),
            project_version: &self.version,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    pub fn tag_prefix(&self) -> &str {
        &self.tag_prefix
    }

    pub fn docker_version(&self) -> Option<&str> {
        self.docker_version.as_deref()
    }

    pub fn docker_entry(&self) -> Option<&str> {
        self.docker_entry.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn revision(&self) -> Option<&RevisionInfo> {
        self.revision.as_ref()
    }

    /// Version-tagged image reference.
    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    /// Image reference pinned to `short_commit`.
    pub fn image_name_by_commit(&self, short_commit: &str) -> String {
        naming::image_name_by_commit(&self.tag_prefix, &self.name, short_commit)
    }

    /// Image reference pinned to the commit currently checked out.
    ///
    /// Queries git on every call and fails if no repository is present.
    pub fn current_commit_image(&self, resolver: &RevisionResolver) -> crate::Result<String> {
        let short = resolver.short_commit()?;
        let image = self.image_name_by_commit(&short);
        tracing::info!(image = %image, "commit-pinned image");
        Ok(image)
    }
}
