use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Recreate `context_dir` from `source_dir` plus the build artifact.
///
/// Existing contents of `context_dir` are wiped. Every file under
/// `source_dir` is copied with its relative layout, then `artifact` is
/// copied in by file name. Returns the path of the copied artifact.
pub fn prepare_context(
    source_dir: &Path,
    context_dir: &Path,
    artifact: &Path,
) -> Result<PathBuf, StagingError> {
    if !source_dir.is_dir() {
        return Err(StagingError::SourceMissing(source_dir.to_path_buf()));
    }

    if context_dir.exists() {
        std::fs::remove_dir_all(context_dir).map_err(|e| StagingError::Cleanup {
            path: context_dir.to_path_buf(),
            source: e,
        })?;
    }
    create_dir(context_dir)?;

    for entry in WalkDir::new(source_dir).follow_links(true) {
        let entry = entry.map_err(|e| StagingError::Walk {
            path: source_dir.to_path_buf(),
            source: e,
        })?;
        let relative = match entry.path().strip_prefix(source_dir) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => continue,
        };
        let dst = context_dir.join(relative);

        if entry.file_type().is_dir() {
            create_dir(&dst)?;
        } else {
            copy_file(entry.path(), &dst)?;
        }
    }

    let file_name = artifact
        .file_name()
        .ok_or_else(|| StagingError::InvalidArtifact(artifact.to_path_buf()))?;
    let staged_artifact = context_dir.join(file_name);
    copy_file(artifact, &staged_artifact)?;

    tracing::debug!(
        context = %context_dir.display(),
        artifact = %staged_artifact.display(),
        "build context prepared"
    );

    Ok(staged_artifact)
}

/// Write rendered content to `dir/relative`, creating parent directories.
pub fn write_staged(dir: &Path, relative: &Path, content: &str) -> Result<PathBuf, StagingError> {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    std::fs::write(&path, content).map_err(|e| StagingError::Write {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}

fn create_dir(path: &Path) -> Result<(), StagingError> {
    std::fs::create_dir_all(path).map_err(|e| StagingError::Create {
        path: path.to_path_buf(),
        source: e,
    })
}

fn copy_file(src: &Path, dst: &Path) -> Result<(), StagingError> {
    std::fs::copy(src, dst)
        .map(|_| ())
        .map_err(|e| StagingError::CopyFile {
            path: src.to_path_buf(),
            source: e,
        })
}

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("docker source directory not found: {0}")]
    SourceMissing(PathBuf),
    #[error("failed to clean up staging directory {path}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create directory {path}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to walk {path}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("failed to copy file {path}")]
    CopyFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("artifact path has no file name: {0}")]
    InvalidArtifact(PathBuf),
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
