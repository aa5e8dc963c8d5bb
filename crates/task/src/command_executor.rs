use crate::executor::TargetContext;
use crate::target::TargetBody;
use async_trait::async_trait;
use rivet_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Target body that runs an external command.
///
/// The command inherits stdio and runs in the build's working directory (or
/// a directory relative to it). A non-zero exit code fails the target.
#[derive(Debug, Clone)]
pub struct CommandBody {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    current_dir: Option<PathBuf>,
}

impl CommandBody {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
        }
    }

    /// `sh -c <script>`
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Directory to run in; relative paths are joined to the build directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run to completion and check the exit status
    pub async fn execute(&self, working_directory: &Path) -> Result<ExitStatus> {
        let dir = match &self.current_dir {
            Some(dir) => working_directory.join(dir),
            None => working_directory.to_path_buf(),
        };

        tracing::debug!(
            command = %self.program,
            args = ?self.args,
            dir = %dir.display(),
            "executing command"
        );

        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&dir)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| {
                Error::command_execution(
                    self.program.clone(),
                    self.args.clone(),
                    format!("failed to execute command: {e}"),
                    None,
                )
            })?;

        if !status.success() {
            return Err(Error::command_execution(
                self.program.clone(),
                self.args.clone(),
                "command exited unsuccessfully",
                status.code(),
            ));
        }
        Ok(status)
    }
}

#[async_trait]
impl TargetBody for CommandBody {
    async fn run(&self, ctx: &TargetContext<'_>) -> anyhow::Result<()> {
        self.execute(ctx.working_directory()).await?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_successful_command_runs_in_working_directory() {
        let temp_dir = TempDir::new().unwrap();
        CommandBody::shell("touch marker")
            .execute(temp_dir.path())
            .await
            .unwrap();
        assert!(temp_dir.path().join("marker").exists());
    }

    #[tokio::test]
    async fn test_relative_current_dir() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("sub")).unwrap();
        CommandBody::shell("touch marker")
            .current_dir("sub")
            .execute(temp_dir.path())
            .await
            .unwrap();
        assert!(temp_dir.path().join("sub").join("marker").exists());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_command_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = CommandBody::shell("exit 3")
            .execute(temp_dir.path())
            .await
            .unwrap_err();
        match err {
            Error::CommandExecution { exit_code, .. } => assert_eq!(exit_code, Some(3)),
            other => panic!("expected command error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let temp_dir = TempDir::new().unwrap();
        let err = CommandBody::new("rivet-definitely-not-a-program")
            .execute(temp_dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to execute command"));
    }

    #[tokio::test]
    async fn test_env_is_passed() {
        let temp_dir = TempDir::new().unwrap();
        CommandBody::shell("test \"$GREETING\" = hello")
            .env("GREETING", "hello")
            .execute(temp_dir.path())
            .await
            .unwrap();
    }
}
