use std::path::Path;

use crate::error::KubectlError;
use crate::executor::{CommandExecutor, CommandOutput, RealExecutor, args};

/// Outcome of a best-effort delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Deleted,
    /// The object did not exist; treated as success.
    NotFound,
}

/// Cluster operations through the `kubectl` CLI.
pub struct Kubectl<E: CommandExecutor = RealExecutor> {
    executor: E,
}

impl Kubectl<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor::new("kubectl"),
        }
    }
}

impl Default for Kubectl<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> Kubectl<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// `kubectl create configmap <name> --from-literal=k=v ...`
    pub async fn create_configmap<'a>(
        &self,
        name: &str,
        literals: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<(), KubectlError> {
        let mut cmd = args(["create", "configmap", name]);
        cmd.extend(
            literals
                .into_iter()
                .map(|(k, v)| format!("--from-literal={k}={v}")),
        );
        self.required(cmd).await
    }

    pub async fn delete_configmap(&self, name: &str) -> Result<Deletion, KubectlError> {
        self.best_effort_delete(args(["delete", "configmap", name]))
            .await
    }

    /// `kubectl apply -f <manifest>` (merge semantics)
    pub async fn apply(&self, manifest: &Path) -> Result<(), KubectlError> {
        self.required(args(["apply", "-f", path_str(manifest)?]))
            .await
    }

    pub async fn delete_deployment(&self, name: &str) -> Result<Deletion, KubectlError> {
        self.best_effort_delete(args(["delete", "deployment", name]))
            .await
    }

    /// `kubectl create -f <manifest>`
    pub async fn create(&self, manifest: &Path) -> Result<(), KubectlError> {
        self.required(args(["create", "-f", path_str(manifest)?]))
            .await
    }

    pub async fn client_version(&self) -> Result<String, KubectlError> {
        let cmd = args(["version", "--client"]);
        let output = self.exec(&cmd).await?;
        if output.success {
            Ok(output.stdout.lines().next().unwrap_or_default().trim().to_owned())
        } else {
            Err(KubectlError::CommandFailed {
                args: cmd,
                stderr: output.stderr,
            })
        }
    }

    async fn exec(&self, cmd: &[String]) -> Result<CommandOutput, KubectlError> {
        self.executor
            .run(cmd)
            .await
            .map_err(|e| KubectlError::Exec { source: e })
    }

    async fn required(&self, cmd: Vec<String>) -> Result<(), KubectlError> {
        let output = self.exec(&cmd).await?;
        if output.success {
            tracing::debug!(args = ?cmd, stdout = %output.stdout.trim(), "kubectl ok");
            Ok(())
        } else {
            Err(KubectlError::CommandFailed {
                args: cmd,
                stderr: output.stderr,
            })
        }
    }

    async fn best_effort_delete(&self, cmd: Vec<String>) -> Result<Deletion, KubectlError> {
        let output = self.exec(&cmd).await?;
        if output.success {
            Ok(Deletion::Deleted)
        } else if is_not_found(&output.stderr) {
            tracing::debug!(args = ?cmd, "nothing to delete");
            Ok(Deletion::NotFound)
        } else {
            Err(KubectlError::CommandFailed {
                args: cmd,
                stderr: output.stderr,
            })
        }
    }
}

/// kubectl reports `Error from server (NotFound): ... not found`.
fn is_not_found(stderr: &str) -> bool {
    stderr.contains("(NotFound)") || stderr.trim_end().ends_with("not found")
}

fn path_str(path: &Path) -> Result<&str, KubectlError> {
    path.to_str()
        .ok_or_else(|| KubectlError::InvalidPath(path.to_path_buf()))
}
