use std::path::{Path, PathBuf};

/// Locate the single build artifact in `dist_dir`.
///
/// Only regular files directly inside `dist_dir` count.
///
/// # Errors
///
/// - [`Error::DistDirRead`](crate::Error::DistDirRead) if the directory cannot be read
/// - [`Error::NoArtifact`](crate::Error::NoArtifact) if it holds no file
/// - [`Error::MultipleArtifacts`](crate::Error::MultipleArtifacts) if it holds more than one
pub fn resolve_artifact(dist_dir: &Path) -> crate::Result<PathBuf> {
    let read_err = |e: std::io::Error| crate::Error::DistDirRead {
        path: dist_dir.to_path_buf(),
        source: e,
    };

    let mut artifacts = Vec::new();
    for entry in std::fs::read_dir(dist_dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if entry.file_type().map_err(read_err)?.is_file() {
            artifacts.push(entry.path());
        }
    }
    artifacts.sort();

    match artifacts.len() {
        0 => Err(crate::Error::NoArtifact {
            dir: dist_dir.to_path_buf(),
        }),
        1 => {
            let artifact = artifacts.remove(0);
            tracing::debug!(artifact = %artifact.display(), "resolved build artifact");
            Ok(artifact)
        }
        _ => Err(crate::Error::MultipleArtifacts {
            dir: dist_dir.to_path_buf(),
            found: artifacts
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect(),
        }),
    }
}
