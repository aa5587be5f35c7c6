use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("`{program}` could not be started; is it installed and on PATH?")]
    NotFound {
        program: String,
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("container engine unavailable")]
    Exec { source: ExecError },

    #[error("image build failed: {message}")]
    Build { message: String, log: Vec<String> },

    #[error("image {image} does not exist locally")]
    ImageNotFound { image: String },

    #[error("tag {target} already exists; pass force to overwrite")]
    TagExists { target: String },

    #[error("docker command failed: {args:?}\n{stderr}")]
    CommandFailed { args: Vec<String>, stderr: String },

    #[error("path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum KubectlError {
    #[error("cluster CLI unavailable")]
    Exec { source: ExecError },

    #[error("kubectl command failed: {args:?}\n{stderr}")]
    CommandFailed { args: Vec<String>, stderr: String },

    #[error("manifest path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),
}
