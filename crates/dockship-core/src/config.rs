use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// dockship.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockshipConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub kubernetes: KubernetesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (defaults to Cargo.toml package name)
    pub name: Option<String>,
    /// Project version (defaults to Cargo.toml package version)
    pub version: Option<String>,
    /// Build output directory
    #[serde(default = "default_target_dir")]
    pub target_dir: PathBuf,
    /// Directory holding the single distributable artifact
    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockerConfig {
    /// Registry prefix, e.g. `registry.local/team`
    pub tag_prefix: Option<String>,
    /// Explicit image version, overriding the project version
    pub version: Option<String>,
    /// Entry point handed to the Dockerfile template as `docker_entry`
    pub entry: Option<String>,
    /// Static build-context files, including the `Dockerfile` template
    pub source_dir: Option<PathBuf>,
    /// Staging directory for the build context (defaults to `<target_dir>/context`)
    pub context_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubernetesConfig {
    /// Namespace exposed to manifest templates as `project.namespace`
    pub namespace: Option<String>,
    /// Directory holding config-map sources
    #[serde(default = "default_resources_dir")]
    pub resources_dir: PathBuf,
    /// Directory holding service and deployment templates and the user config file
    #[serde(default = "default_manifests_dir")]
    pub manifests_dir: PathBuf,
    /// Base user config file, relative to `manifests_dir`
    #[serde(default = "default_user_config")]
    pub user_config: PathBuf,
    /// Rendered manifests are written here (defaults to `<target_dir>/kubernetes`)
    pub staging_dir: Option<PathBuf>,
    #[serde(default)]
    pub config_maps: Vec<UnitConfig>,
    #[serde(default)]
    pub services: Vec<UnitConfig>,
    #[serde(default)]
    pub deployments: Vec<UnitConfig>,
}

/// A named cluster object and the file it is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitConfig {
    pub name: String,
    pub path: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: None,
            version: None,
            target_dir: default_target_dir(),
            dist_dir: default_dist_dir(),
        }
    }
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            resources_dir: default_resources_dir(),
            manifests_dir: default_manifests_dir(),
            user_config: default_user_config(),
            staging_dir: None,
            config_maps: Vec::new(),
            services: Vec::new(),
            deployments: Vec::new(),
        }
    }
}

impl DockshipConfig {
    /// Load from dockship.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join("dockship.toml");
        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })
        } else {
            tracing::debug!(path = %config_path.display(), "no dockship.toml; using defaults");
            Ok(Self::default())
        }
    }
}

impl DockerConfig {
    pub fn source_dir(&self) -> PathBuf {
        self.source_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("src/main/docker"))
    }

    pub fn context_dir(&self, project: &ProjectConfig) -> PathBuf {
        self.context_dir
            .clone()
            .unwrap_or_else(|| project.target_dir.join("context"))
    }
}

impl KubernetesConfig {
    pub fn staging_dir(&self, project: &ProjectConfig) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(|| project.target_dir.join("kubernetes"))
    }
}

fn default_target_dir() -> PathBuf {
    PathBuf::from("target")
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from("target/dist")
}

fn default_resources_dir() -> PathBuf {
    PathBuf::from("src/main/resources")
}

fn default_manifests_dir() -> PathBuf {
    PathBuf::from("src/main/kubernetes")
}

fn default_user_config() -> PathBuf {
    PathBuf::from("config.ini")
}
