use std::path::Path;

use dockship_core::naming::split_reference;

use crate::error::EngineError;
use crate::executor::{CommandExecutor, CommandOutput, RealExecutor, args};

/// Environment variable pinning the engine API version.
pub const API_VERSION_ENV: &str = "DOCKER_API_VERSION";

/// One record of engine output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Status(String),
    /// An error reported in-band; the surrounding stream may still complete.
    Error(String),
}

impl LogRecord {
    pub fn text(&self) -> &str {
        match self {
            LogRecord::Status(s) | LogRecord::Error(s) => s,
        }
    }
}

/// Finite, single-pass sequence of engine log records.
///
/// Consumers drain it completely: build logs are kept for diagnostics and
/// push logs must be checked record by record for [`LogRecord::Error`].
#[derive(Debug)]
pub struct LogStream {
    records: std::vec::IntoIter<LogRecord>,
}

impl LogStream {
    pub fn new(records: Vec<LogRecord>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }
}

impl Iterator for LogStream {
    type Item = LogRecord;

    fn next(&mut self) -> Option<LogRecord> {
        self.records.next()
    }
}

/// A locally known image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub reference: String,
    pub id: String,
}

/// Container engine operations used by the image pipeline.
#[allow(async_fn_in_trait)]
pub trait ContainerEngine: Send + Sync {
    /// Build `context` into an image tagged `tag`.
    ///
    /// On failure returns [`EngineError::Build`] carrying the full log.
    async fn build(&self, context: &Path, tag: &str) -> Result<LogStream, EngineError>;

    /// Push `image`, or its repository under `tag` when given.
    ///
    /// Push failures are reported as [`LogRecord::Error`] inside the stream.
    async fn push(&self, image: &str, tag: Option<&str>) -> Result<LogStream, EngineError>;

    async fn inspect(&self, image: &str) -> Result<ImageInfo, EngineError>;

    /// Add `target` as a new reference to `image`.
    async fn tag(&self, image: &str, target: &str, force: bool) -> Result<(), EngineError>;

    /// Engine server version, used for preflight checks.
    async fn version(&self) -> Result<String, EngineError>;
}

/// [`ContainerEngine`] backed by the `docker` CLI.
pub struct DockerCli<E: CommandExecutor = RealExecutor> {
    executor: E,
    api_version: Option<String>,
}

impl DockerCli<RealExecutor> {
    /// Reads [`API_VERSION_ENV`] once and forwards it to every invocation.
    pub fn new() -> Self {
        let api_version = std::env::var(API_VERSION_ENV).ok();
        let mut executor = RealExecutor::new("docker");
        if let Some(version) = &api_version {
            tracing::debug!(version = %version, "pinning docker API version");
            executor = executor.with_env(API_VERSION_ENV, version.as_str());
        }
        Self {
            executor,
            api_version,
        }
    }
}

impl Default for DockerCli<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> DockerCli<E> {
    pub fn with_executor(executor: E) -> Self {
        Self {
            executor,
            api_version: None,
        }
    }

    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    async fn run(&self, args: &[String]) -> Result<CommandOutput, EngineError> {
        self.executor
            .run(args)
            .await
            .map_err(|e| EngineError::Exec { source: e })
    }
}

impl<E: CommandExecutor> ContainerEngine for DockerCli<E> {
    async fn build(&self, context: &Path, tag: &str) -> Result<LogStream, EngineError> {
        let context_str = context
            .to_str()
            .ok_or_else(|| EngineError::InvalidPath(context.to_path_buf()))?;

        let output = self.run(&args(["build", "--tag", tag, context_str])).await?;
        let log: Vec<String> = output.lines().map(str::to_owned).collect();

        if output.success {
            Ok(LogStream::new(log.into_iter().map(LogRecord::Status).collect()))
        } else {
            let message = output
                .stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("docker build exited unsuccessfully")
                .trim()
                .to_owned();
            Err(EngineError::Build { message, log })
        }
    }

    async fn push(&self, image: &str, tag: Option<&str>) -> Result<LogStream, EngineError> {
        let reference = match tag {
            Some(tag) => format!("{}:{tag}", split_reference(image).0),
            None => image.to_owned(),
        };

        let output = self.run(&args(["push", &reference])).await?;
        let mut records: Vec<LogRecord> = output
            .stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| LogRecord::Status(l.to_owned()))
            .collect();

        if !output.success {
            let stderr = output.stderr.trim();
            records.push(LogRecord::Error(if stderr.is_empty() {
                format!("docker push {reference} exited unsuccessfully")
            } else {
                stderr.to_owned()
            }));
        }

        Ok(LogStream::new(records))
    }

    async fn inspect(&self, image: &str) -> Result<ImageInfo, EngineError> {
        let cmd = args(["image", "inspect", "--format", "{{.Id}}", image]);
        let output = self.run(&cmd).await?;

        if output.success {
            Ok(ImageInfo {
                reference: image.to_owned(),
                id: output.stdout.trim().to_owned(),
            })
        } else if output.stderr.to_ascii_lowercase().contains("no such image") {
            Err(EngineError::ImageNotFound {
                image: image.to_owned(),
            })
        } else {
            Err(EngineError::CommandFailed {
                args: cmd,
                stderr: output.stderr,
            })
        }
    }

    async fn tag(&self, image: &str, target: &str, force: bool) -> Result<(), EngineError> {
        if !force {
            match self.inspect(target).await {
                Ok(_) => {
                    return Err(EngineError::TagExists {
                        target: target.to_owned(),
                    });
                }
                Err(EngineError::ImageNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        let cmd = args(["tag", image, target]);
        let output = self.run(&cmd).await?;
        if output.success {
            Ok(())
        } else {
            Err(EngineError::CommandFailed {
                args: cmd,
                stderr: output.stderr,
            })
        }
    }

    async fn version(&self) -> Result<String, EngineError> {
        let cmd = args(["version", "--format", "{{.Server.Version}}"]);
        let output = self.run(&cmd).await?;
        if output.success {
            Ok(output.stdout.trim().to_owned())
        } else {
            Err(EngineError::CommandFailed {
                args: cmd,
                stderr: output.stderr,
            })
        }
    }
}
