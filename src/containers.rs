//! Restarting dependent containers after an address change.

use crate::error::Result;
use std::io;

/// Runs `docker restart <names...>`.
pub struct ContainerRestarter {
    program: String,
    names: Vec<String>,
}

impl ContainerRestarter {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            program: "docker".to_string(),
            names,
        }
    }

    /// Use a different container CLI (e.g. `podman`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub async fn restart(&self) -> Result<()> {
        if self.names.is_empty() {
            return Ok(());
        }

        tracing::info!("Restarting container(s) {}", self.names.join(" "));
        let output = tokio::process::Command::new(&self.program)
            .arg("restart")
            .args(&self.names)
            .output()
            .await?;

        if !output.status.success() {
            return Err(io::Error::other(format!(
                "{} restart exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))
            .into());
        }

        tracing::info!("Restarted container(s) successfully.");
        Ok(())
    }
}
