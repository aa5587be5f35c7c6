use std::path::PathBuf;

use dockship_build::{RenderError, StagingError};
use dockship_engine::KubectlError;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("kubectl is not usable")]
    Preflight { source: KubectlError },

    #[error("path {path} for {name} must be relative and stay inside its directory")]
    InvalidPath { name: String, path: PathBuf },

    #[error("failed to load config map source for {name}")]
    Config {
        name: String,
        source: dockship_core::Error,
    },

    #[error("failed to render manifest for {name}")]
    Render { name: String, source: RenderError },

    #[error("failed to stage manifest for {name}")]
    Staging { name: String, source: StagingError },

    #[error("kubectl failed for {name}")]
    Kubectl { name: String, source: KubectlError },
}
