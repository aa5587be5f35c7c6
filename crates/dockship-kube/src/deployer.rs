use std::path::{Component, Path, PathBuf};

use dockship_build::staging;
use dockship_build::{ManifestRenderer, TemplateContext};
use dockship_core::layering::environment_path;
use dockship_core::{ConfigMap, DockshipConfig};
use dockship_engine::{CommandExecutor, Deletion, Kubectl, KubectlError};

use crate::error::DeployError;
use crate::plan::{DeployPlan, DeploymentUnit, UnitKind};

const SERVICES_DIR: &str = "services";
const DEPLOYMENTS_DIR: &str = "deployments";

/// Source and staging directories for cluster manifests.
#[derive(Debug, Clone)]
pub struct ManifestLayout {
    pub resources_dir: PathBuf,
    pub manifests_dir: PathBuf,
    pub staging_dir: PathBuf,
}

impl ManifestLayout {
    pub fn from_config(project_dir: &Path, config: &DockshipConfig) -> Self {
        let kube = &config.kubernetes;
        Self {
            resources_dir: project_dir.join(&kube.resources_dir),
            manifests_dir: project_dir.join(&kube.manifests_dir),
            staging_dir: project_dir.join(kube.staging_dir(&config.project)),
        }
    }

    /// Base user config file for template values. It sits beside the
    /// templates, not with the config-map sources.
    pub fn user_config(&self, config: &DockshipConfig) -> PathBuf {
        self.manifests_dir.join(&config.kubernetes.user_config)
    }
}

/// Renders manifests and applies them to the cluster through `kubectl`.
///
/// Deployments are replaced (delete, then create); services are applied;
/// config maps are recreated from an environment-specific config file.
pub struct ClusterDeployer<'a, E: CommandExecutor> {
    kubectl: &'a Kubectl<E>,
    renderer: ManifestRenderer,
    context: TemplateContext,
    layout: ManifestLayout,
    environment: String,
}

impl<'a, E: CommandExecutor> ClusterDeployer<'a, E> {
    pub fn new(
        kubectl: &'a Kubectl<E>,
        context: TemplateContext,
        layout: ManifestLayout,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            kubectl,
            renderer: ManifestRenderer::new(),
            context,
            layout,
            environment: environment.into(),
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Check that `kubectl` can be executed.
    pub async fn preflight(&self) -> Result<String, DeployError> {
        let version = self
            .kubectl
            .client_version()
            .await
            .map_err(|e| DeployError::Preflight { source: e })?;
        tracing::debug!(version = %version, "kubectl available");
        Ok(version)
    }

    /// Recreate config map `name` from `<resources>/<path>` with the
    /// environment suffix applied. Only that one file is read.
    pub async fn apply_config_object(&self, name: &str, path: &Path) -> Result<(), DeployError> {
        confined(name, path)?;
        let source = environment_path(&self.layout.resources_dir.join(path), &self.environment);
        let values = ConfigMap::load(&source).map_err(|e| DeployError::Config {
            name: name.to_owned(),
            source: e,
        })?;

        tracing::info!(name, source = %source.display(), keys = values.len(), "applying config map");
        let deletion = self
            .kubectl
            .delete_configmap(name)
            .await
            .map_err(kubectl_error(name))?;
        log_deletion(UnitKind::ConfigObject, name, deletion);

        self.kubectl
            .create_configmap(name, values.iter())
            .await
            .map_err(kubectl_error(name))
    }

    /// Render `template`, stage it under `services/` and `kubectl apply` it.
    pub async fn apply_service(&self, name: &str, template: &Path) -> Result<PathBuf, DeployError> {
        let staged = self.render_and_stage(name, template, SERVICES_DIR)?;
        tracing::info!(name, manifest = %staged.display(), "applying service");
        self.kubectl
            .apply(&staged)
            .await
            .map_err(kubectl_error(name))?;
        Ok(staged)
    }

    /// Render `template`, stage it under `deployments/`, delete the existing
    /// deployment if any, then `kubectl create` it.
    pub async fn apply_deployment(
        &self,
        name: &str,
        template: &Path,
    ) -> Result<PathBuf, DeployError> {
        let staged = self.render_and_stage(name, template, DEPLOYMENTS_DIR)?;
        tracing::info!(name, manifest = %staged.display(), "replacing deployment");

        let deletion = self
            .kubectl
            .delete_deployment(name)
            .await
            .map_err(kubectl_error(name))?;
        log_deletion(UnitKind::Deployment, name, deletion);

        self.kubectl
            .create(&staged)
            .await
            .map_err(kubectl_error(name))?;
        Ok(staged)
    }

    pub async fn apply_unit(&self, unit: &DeploymentUnit) -> Result<(), DeployError> {
        match unit.kind {
            UnitKind::ConfigObject => self.apply_config_object(&unit.name, &unit.path).await,
            UnitKind::Service => self.apply_service(&unit.name, &unit.path).await.map(|_| ()),
            UnitKind::Deployment => self
                .apply_deployment(&unit.name, &unit.path)
                .await
                .map(|_| ()),
        }
    }

    /// Apply every unit in order; the first failure aborts the rest.
    pub async fn deploy(&self, plan: &DeployPlan) -> Result<(), DeployError> {
        tracing::info!(
            environment = %self.environment,
            units = plan.len(),
            "deploying"
        );
        for unit in plan.ordered() {
            self.apply_unit(unit).await?;
        }
        Ok(())
    }

    fn render_and_stage(
        &self,
        name: &str,
        template: &Path,
        kind_dir: &str,
    ) -> Result<PathBuf, DeployError> {
        confined(name, template)?;
        let rendered = self
            .renderer
            .render_file(&self.layout.manifests_dir.join(template), &self.context)
            .map_err(|e| DeployError::Render {
                name: name.to_owned(),
                source: e,
            })?;

        staging::write_staged(&self.layout.staging_dir.join(kind_dir), template, &rendered).map_err(
            |e| DeployError::Staging {
                name: name.to_owned(),
                source: e,
            },
        )
    }
}

/// Unit paths are joined onto a layout directory and must not leave it.
fn confined(name: &str, path: &Path) -> Result<(), DeployError> {
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes || path.as_os_str().is_empty() {
        return Err(DeployError::InvalidPath {
            name: name.to_owned(),
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn kubectl_error(name: &str) -> impl FnOnce(KubectlError) -> DeployError + '_ {
    move |e| DeployError::Kubectl {
        name: name.to_owned(),
        source: e,
    }
}

fn log_deletion(kind: UnitKind, name: &str, deletion: Deletion) {
    match deletion {
        Deletion::Deleted => tracing::debug!(%kind, name, "deleted existing object"),
        Deletion::NotFound => tracing::debug!(%kind, name, "no existing object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_resolves_against_project_dir() {
        let config = DockshipConfig::default();
        let layout = ManifestLayout::from_config(Path::new("/work/orders"), &config);
        assert_eq!(layout.resources_dir, Path::new("/work/orders/src/main/resources"));
        assert_eq!(layout.manifests_dir, Path::new("/work/orders/src/main/kubernetes"));
        assert_eq!(layout.staging_dir, Path::new("/work/orders/target/kubernetes"));
        assert_eq!(
            layout.user_config(&config),
            Path::new("/work/orders/src/main/kubernetes/config.ini")
        );
    }

    #[test]
    fn unit_paths_must_stay_inside_their_directory() {
        assert!(confined("S1", Path::new("s1.yaml")).is_ok());
        assert!(confined("S1", Path::new("svc/./s1.yaml")).is_ok());
        for bad in ["/etc/passwd", "../s1.yaml", "svc/../../s1.yaml", ""] {
            let err = confined("S1", Path::new(bad)).unwrap_err();
            assert!(
                matches!(err, DeployError::InvalidPath { ref name, .. } if name == "S1"),
                "{bad} accepted"
            );
        }
    }
}
