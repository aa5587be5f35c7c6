//! External tool clients for dockship: the `docker` container engine and
//! the `kubectl` cluster CLI, both driven through a [`CommandExecutor`].

pub mod docker;
pub mod error;
pub mod executor;
pub mod kubectl;

pub use docker::{ContainerEngine, DockerCli, ImageInfo, LogRecord, LogStream};
pub use error::{EngineError, ExecError, KubectlError};
pub use executor::{CommandExecutor, CommandOutput, RealExecutor};
pub use kubectl::{Deletion, Kubectl};
