//! Kubernetes deployment for dockship: config maps, services and
//! deployments rendered from templates and applied with `kubectl`.

pub mod deployer;
pub mod error;
pub mod plan;

pub use deployer::{ClusterDeployer, ManifestLayout};
pub use error::DeployError;
pub use plan::{DeployPlan, DeploymentUnit, UnitKind};
