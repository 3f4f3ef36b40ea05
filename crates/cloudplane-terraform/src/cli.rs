//! terraform CLI driver
//!
//! Wraps the `terraform` binary the same way the rest of the system wraps
//! vendor CLIs: spawn, capture stdio, and trust nothing but the exit code.

use crate::error::{Result, TerraformError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Captured output of one terraform invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Driver for the terraform CLI, scoped to one working directory.
pub struct Terraform {
    binary: PathBuf,
    workdir: PathBuf,
    timeout: Duration,
}

impl Terraform {
    pub fn new(workdir: impl AsRef<Path>) -> Self {
        Self {
            binary: PathBuf::from("terraform"),
            workdir: workdir.as_ref().to_path_buf(),
            timeout: Duration::from_secs(600),
        }
    }

    /// Use a specific terraform binary instead of whatever is on PATH.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Timeout applied to every invocation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the binary is runnable.
    pub async fn check_installed(&self) -> Result<String> {
        let output = self.run(&["version", "-json"]).await?;
        let parsed: serde_json::Value = serde_json::from_str(&output.stdout)?;
        Ok(parsed["terraform_version"]
            .as_str()
            .unwrap_or("unknown")
            .to_string())
    }

    pub async fn init(&self) -> Result<CommandOutput> {
        self.run(&["init", "-input=false", "-no-color"]).await
    }

    pub async fn plan(&self) -> Result<CommandOutput> {
        self.run(&["plan", "-input=false", "-no-color", "-out=plan.tfplan"])
            .await
    }

    pub async fn apply(&self) -> Result<CommandOutput> {
        self.run(&["apply", "-input=false", "-no-color", "-auto-approve", "plan.tfplan"])
            .await
    }

    pub async fn destroy(&self) -> Result<CommandOutput> {
        self.run(&["destroy", "-input=false", "-no-color", "-auto-approve"])
            .await
    }

    /// Adopt a live resource into state at the given construct address.
    pub async fn import(&self, address: &str, external_id: &str) -> Result<CommandOutput> {
        self.run(&["import", "-input=false", "-no-color", address, external_id])
            .await
    }

    /// `terraform output -json`, parsed into key -> value.
    pub async fn outputs(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        let output = self.run(&["output", "-json", "-no-color"]).await?;
        let parsed: serde_json::Value = serde_json::from_str(&output.stdout)?;
        let Some(object) = parsed.as_object() else {
            return Err(TerraformError::MissingOutput("<root>".to_string()));
        };

        // `terraform output -json` wraps each value in {value, type, sensitive}
        let mut result = serde_json::Map::new();
        for (key, wrapper) in object {
            let value = wrapper
                .get("value")
                .cloned()
                .ok_or_else(|| TerraformError::MissingOutput(key.clone()))?;
            result.insert(key.clone(), value);
        }
        Ok(result)
    }

    /// The opaque state file, if one exists yet.
    pub async fn read_state(&self) -> Result<Option<serde_json::Value>> {
        let path = self.workdir.join("terraform.tfstate");
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Seed the working directory with a previously captured state file.
    pub async fn write_state(&self, state: &serde_json::Value) -> Result<()> {
        let path = self.workdir.join("terraform.tfstate");
        tokio::fs::write(&path, serde_json::to_string(state)?).await?;
        tracing::debug!("Restored terraform state to {}", path.display());
        Ok(())
    }

    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        cmd.current_dir(&self.workdir);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.env("TF_IN_AUTOMATION", "1");

        tracing::debug!(
            "Running: terraform {} (in {})",
            args.join(" "),
            self.workdir.display()
        );

        let fut = cmd.output();
        let output = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TerraformError::BinaryNotFound
                } else {
                    TerraformError::Io(e)
                }
            })?,
            Err(_) => {
                return Err(TerraformError::Timeout {
                    command: args.first().unwrap_or(&"").to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(TerraformError::CommandFailed {
                command: args.first().unwrap_or(&"").to_string(),
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}
