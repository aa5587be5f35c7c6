mod deploy;
mod doctor;
mod image;
mod image_name;

use std::path::{Path, PathBuf};

use dockship_core::{DockshipConfig, ProjectFacts, RevisionResolver};

pub use deploy::deploy;
pub use doctor::doctor;
pub use image::{package, publish, tag};
pub use image_name::image_name;

/// Configuration and facts shared by every command.
pub(crate) struct Project {
    pub dir: PathBuf,
    pub config: DockshipConfig,
    pub facts: ProjectFacts,
    pub resolver: RevisionResolver,
}

impl Project {
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let config = DockshipConfig::load(dir)?;
        let resolver = RevisionResolver::new(dir);
        let facts = ProjectFacts::resolve(dir, &config, resolver.resolve())?;
        Ok(Self {
            dir: dir.to_path_buf(),
            config,
            facts,
            resolver,
        })
    }
}
