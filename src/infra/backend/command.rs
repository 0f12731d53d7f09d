//! Subprocess-based backend implementation.
//!
//! Launches a configurable model CLI, writes the request as one JSON object
//! on stdin, and reads the model's raw text reply from stdout. Any tool that
//! speaks this stdio contract can act as the backend.

use super::{BackendRequest, GenerationBackend};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub struct CommandBackend {
    program: String,
    args: Vec<String>,
}

impl CommandBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Whether the configured command resolves on PATH.
    pub fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }
}

#[async_trait]
impl GenerationBackend for CommandBackend {
    async fn invoke(&self, request: &BackendRequest) -> Result<String> {
        let program = which::which(&self.program)
            .with_context(|| format!("backend command '{}' not found in PATH", self.program))?;

        log::debug!("spawn: {} {}", program.display(), self.args.join(" "));

        let mut child = Command::new(&program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn backend process {}", program.display()))?;

        let payload = serde_json::to_vec(request).context("failed to encode backend request")?;
        let mut stdin = child
            .stdin
            .take()
            .context("backend process has no stdin")?;
        stdin
            .write_all(&payload)
            .await
            .context("failed to write request to backend process")?;
        // Close stdin so the process knows the request is complete.
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .context("failed to read backend process output")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "backend process exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
