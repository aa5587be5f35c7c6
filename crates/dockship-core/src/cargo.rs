//! Project metadata lookup via `cargo metadata`.
//!
//! Cargo is the host build tool: it owns the package name and version, and
//! its binary targets supply a default `docker_entry` when none is configured.

use cargo_metadata::{MetadataCommand, TargetKind};
use std::path::Path;

/// Package metadata for the project being shipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoProject {
    /// Package name from `[package].name`
    pub name: String,
    /// Resolved version (handles `version.workspace = true`)
    pub version: String,
    /// Binary a container should run, if one can be chosen unambiguously
    pub default_binary: Option<String>,
}

impl CargoProject {
    /// Discover the package whose manifest lives in `project_dir`.
    ///
    /// # Errors
    ///
    /// - [`Error::CargoMetadata`](crate::Error::CargoMetadata) if `cargo metadata` fails
    /// - [`Error::NoPackageInDir`](crate::Error::NoPackageInDir) if `project_dir` is a
    ///   workspace root without `[package]`
    pub fn discover(project_dir: &Path) -> crate::Result<Self> {
        let manifest_path = project_dir.join("Cargo.toml");
        tracing::debug!(path = %manifest_path.display(), "running cargo metadata");

        let metadata = MetadataCommand::new()
            .manifest_path(&manifest_path)
            .no_deps()
            .exec()
            .map_err(|e| crate::Error::CargoMetadata {
                manifest_path: manifest_path.clone(),
                detail: e.to_string(),
            })?;

        let canonical_dir =
            project_dir
                .canonicalize()
                .map_err(|e| crate::Error::ProjectDirResolve {
                    path: project_dir.to_path_buf(),
                    source: e,
                })?;

        let package = metadata
            .packages
            .iter()
            .find(|p| {
                p.manifest_path
                    .as_std_path()
                    .parent()
                    .and_then(|d| d.canonicalize().ok())
                    .is_some_and(|d| d == canonical_dir)
            })
            .ok_or_else(|| crate::Error::NoPackageInDir {
                dir: canonical_dir.clone(),
                workspace_members: metadata
                    .packages
                    .iter()
                    .filter(|p| metadata.workspace_members.contains(&p.id))
                    .map(|p| p.name.to_string())
                    .collect(),
            })?;

        let binaries: Vec<String> = package
            .targets
            .iter()
            .filter(|t| t.kind.contains(&TargetKind::Bin))
            .map(|t| t.name.clone())
            .collect();

        let default_binary =
            pick_binary(&binaries, package.default_run.as_deref(), &package.name);

        tracing::debug!(
            name = %package.name,
            version = %package.version,
            binary = ?default_binary,
            "cargo project discovered"
        );

        Ok(Self {
            name: package.name.to_string(),
            version: package.version.to_string(),
            default_binary,
        })
    }
}

/// `default-run` wins, then a lone binary, then the binary named after the package.
fn pick_binary(binaries: &[String], default_run: Option<&str>, package: &str) -> Option<String> {
    if let Some(name) = default_run
        && binaries.iter().any(|b| b == name)
    {
        return Some(name.to_owned());
    }
    match binaries {
        [only] => Some(only.clone()),
        many => many.iter().find(|b| *b == package).cloned(),
    }
}
