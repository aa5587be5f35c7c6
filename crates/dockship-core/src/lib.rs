//! Core types and configuration for dockship.
//!
//! This crate defines the `dockship.toml` schema ([`DockshipConfig`]),
//! project facts for one pipeline run ([`ProjectFacts`]), layered key/value
//! configuration ([`ConfigMap`]), git revision lookup ([`RevisionResolver`]),
//! image naming and shared error types.

pub mod artifact;
pub mod cargo;
pub mod config;
pub mod error;
pub mod facts;
pub mod layering;
pub mod naming;
pub mod revision;

pub use artifact::resolve_artifact;
pub use cargo::CargoProject;
pub use config::{DockerConfig, DockshipConfig, KubernetesConfig, ProjectConfig, UnitConfig};
pub use error::{Error, Result};
pub use facts::ProjectFacts;
pub use layering::ConfigMap;
pub use naming::VersionSource;
pub use revision::{RevisionInfo, RevisionResolver};
