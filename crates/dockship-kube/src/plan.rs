use std::path::PathBuf;

use dockship_core::KubernetesConfig;

/// Kind of cluster object; the derived order is the apply order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnitKind {
    ConfigObject,
    Service,
    Deployment,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UnitKind::ConfigObject => "configmap",
            UnitKind::Service => "service",
            UnitKind::Deployment => "deployment",
        })
    }
}

/// One object to deploy.
///
/// For config objects `path` is the base config file under the resources
/// directory; otherwise it is the template under the manifests directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentUnit {
    pub kind: UnitKind,
    pub name: String,
    pub path: PathBuf,
}

impl DeploymentUnit {
    pub fn config_object(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(UnitKind::ConfigObject, name, path)
    }

    pub fn service(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(UnitKind::Service, name, path)
    }

    pub fn deployment(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(UnitKind::Deployment, name, path)
    }

    fn new(kind: UnitKind, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            name: name.into(),
            path: path.into(),
        }
    }
}

/// The set of units for one deploy.
#[derive(Debug, Clone, Default)]
pub struct DeployPlan {
    units: Vec<DeploymentUnit>,
}

impl DeployPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &KubernetesConfig) -> Self {
        let mut plan = Self::new();
        for unit in &config.config_maps {
            plan.push(DeploymentUnit::config_object(&unit.name, &unit.path));
        }
        for unit in &config.services {
            plan.push(DeploymentUnit::service(&unit.name, &unit.path));
        }
        for unit in &config.deployments {
            plan.push(DeploymentUnit::deployment(&unit.name, &unit.path));
        }
        plan
    }

    pub fn push(&mut self, unit: DeploymentUnit) {
        self.units.push(unit);
    }

    /// Config objects, then services, then deployments. Units of one kind
    /// keep insertion order.
    pub fn ordered(&self) -> Vec<&DeploymentUnit> {
        let mut units: Vec<&DeploymentUnit> = self.units.iter().collect();
        units.sort_by_key(|u| u.kind);
        units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockship_core::UnitConfig;

    #[test]
    fn ordered_groups_by_kind_and_keeps_order_within_kind() {
        let mut plan = DeployPlan::new();
        plan.push(DeploymentUnit::deployment("d1", "d1.yaml"));
        plan.push(DeploymentUnit::service("s2", "s2.yaml"));
        plan.push(DeploymentUnit::config_object("a", "a.ini"));
        plan.push(DeploymentUnit::service("s1", "s1.yaml"));

        let names: Vec<&str> = plan.ordered().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["a", "s2", "s1", "d1"]);
    }

    #[test]
    fn from_config_collects_all_kinds() {
        let config = KubernetesConfig {
            config_maps: vec![UnitConfig {
                name: "orders-config".to_owned(),
                path: "orders.ini".into(),
            }],
            deployments: vec![UnitConfig {
                name: "orders".to_owned(),
                path: "deployment.yaml".into(),
            }],
            ..Default::default()
        };

        let plan = DeployPlan::from_config(&config);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.ordered()[0].kind, UnitKind::ConfigObject);
        assert_eq!(plan.ordered()[1].kind, UnitKind::Deployment);
    }

    #[test]
    fn empty_plan() {
        assert!(DeployPlan::from_config(&KubernetesConfig::default()).is_empty());
    }
}
