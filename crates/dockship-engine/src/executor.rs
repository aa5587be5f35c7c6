use crate::error::ExecError;

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Non-empty stdout lines followed by non-empty stderr lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .filter(|l| !l.trim().is_empty())
    }
}

/// Abstraction over one external CLI tool for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
/// A non-zero exit status is reported through [`CommandOutput::success`];
/// only a failure to start the program is an error.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor: Send + Sync {
    async fn run(&self, args: &[String]) -> Result<CommandOutput, ExecError>;
}

/// Runs a real program, blocking the pipeline until it exits.
#[derive(Debug, Clone)]
pub struct RealExecutor {
    program: String,
    envs: Vec<(String, String)>,
}

impl RealExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            envs: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl CommandExecutor for RealExecutor {
    async fn run(&self, args: &[String]) -> Result<CommandOutput, ExecError> {
        use std::process::Stdio;

        tracing::debug!(program = %self.program, ?args, "exec");

        let output = tokio::process::Command::new(&self.program)
            .args(args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ExecError::NotFound {
                program: self.program.clone(),
                source: e,
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

pub(crate) fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}
