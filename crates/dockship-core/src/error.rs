use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("`{key}` is not set in dockship.toml")]
    MissingSetting { key: &'static str },

    // ── Cargo project discovery ──
    #[error("cargo metadata failed for {manifest_path}: {detail}")]
    CargoMetadata {
        manifest_path: PathBuf,
        detail: String,
    },

    #[error("failed to resolve project directory {path}")]
    ProjectDirResolve {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "no package found in {dir}; workspace members: {}",
        format_members(workspace_members)
    )]
    NoPackageInDir {
        dir: PathBuf,
        workspace_members: Vec<String>,
    },

    // ── Layered key/value files ──
    #[error("config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("failed to read config file {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "config file {path} declares multiple sections ({}); only one is allowed",
        sections.join(", ")
    )]
    MultipleSections {
        path: PathBuf,
        sections: Vec<String>,
    },

    #[error("malformed config file {path} at line {line}: {reason}")]
    ConfigFormat {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("cannot expand `{key}` in config file {path}: {reason}")]
    ConfigInterpolation {
        path: PathBuf,
        key: String,
        reason: String,
    },

    // ── Build artifacts ──
    #[error("failed to read distribution directory {path}")]
    DistDirRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no artifact found in {dir}")]
    NoArtifact { dir: PathBuf },

    #[error(
        "multiple artifacts found in {dir}: {}; expected exactly one",
        found.join(", ")
    )]
    MultipleArtifacts { dir: PathBuf, found: Vec<String> },

    // ── Source control ──
    #[error("failed to execute git {args:?}")]
    GitCommand {
        args: Vec<String>,
        source: std::io::Error,
    },

    #[error("git {args:?} exited unsuccessfully: {stderr}")]
    GitFailed { args: Vec<String>, stderr: String },
}

impl Error {
    /// Whether this error reports a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::ConfigNotFound { .. } | Error::NoArtifact { .. } => true,
            Error::DistDirRead { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Whether this error reports a malformed key/value file.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Error::MultipleSections { .. }
                | Error::ConfigFormat { .. }
                | Error::ConfigInterpolation { .. }
        )
    }
}

fn format_members(members: &[String]) -> String {
    if members.is_empty() {
        "(none)".to_owned()
    } else {
        members.join(", ")
    }
}
