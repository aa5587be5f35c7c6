use std::path::Path;

use dockship_build::TemplateContext;
use dockship_core::ConfigMap;
use dockship_engine::Kubectl;
use dockship_kube::{ClusterDeployer, DeployPlan, ManifestLayout};

use super::Project;

/// Render and apply every configured unit for `environment`.
pub async fn deploy(dir: &Path, environment: &str) -> anyhow::Result<()> {
    let project = Project::load(dir)?;
    let layout = ManifestLayout::from_config(&project.dir, &project.config);

    let user = ConfigMap::load_layered(&layout.user_config(&project.config), environment)?;
    let image = project.facts.current_commit_image(&project.resolver)?;
    let context = TemplateContext::new(&project.facts, image, user);

    let plan = DeployPlan::from_config(&project.config.kubernetes);
    if plan.is_empty() {
        anyhow::bail!("no config maps, services or deployments configured in dockship.toml");
    }

    let kubectl = Kubectl::new();
    let deployer = ClusterDeployer::new(&kubectl, context, layout, environment);
    deployer.preflight().await?;
    deployer.deploy(&plan).await?;

    println!("Deployed {} units to {environment}", plan.len());
    Ok(())
}
