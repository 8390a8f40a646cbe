// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compose backend invocation.

use crate::spec::{default_networks, fix_spec};
use indexmap::IndexMap;
use parking_lot::Mutex;
use seguro_core::deep_merge;
use serde_json::{json, Value};
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("compose backend exited with status {status}: {stderr}")]
    Backend { status: i32, stderr: String },

    #[error("failed to render compose spec: {0}")]
    Render(String),

    #[error("failed to run compose backend: {0}")]
    Io(#[from] std::io::Error),
}

/// Wraps the local `docker compose` backend.
///
/// Holds the registry of service specs that make up the base
/// specification, and at most one running event-log reader.
pub struct Composer {
    project: String,
    cwd: PathBuf,
    services: Mutex<IndexMap<String, Value>>,
    event_child: Mutex<Option<Child>>,
}

impl Composer {
    pub fn new(project: impl Into<String>, cwd: PathBuf) -> Composer {
        Composer {
            project: project.into(),
            cwd,
            services: Mutex::new(IndexMap::new()),
            event_child: Mutex::new(None),
        }
    }

    /// Add or replace a service definition in the base specification.
    pub fn register_service(&self, name: &str, spec: Value) {
        self.services.lock().insert(name.to_string(), spec);
    }

    pub fn deregister_service(&self, name: &str) {
        self.services.lock().shift_remove(name);
    }

    /// The base specification: all registered services plus the
    /// platform's default external network.
    pub fn base_spec(&self) -> Value {
        let services: Value = {
            let services = self.services.lock();
            services
                .iter()
                .map(|(name, spec)| (name.clone(), spec.clone()))
                .collect::<serde_json::Map<String, Value>>()
                .into()
        };
        json!({
            "services": services,
            "networks": default_networks(),
        })
    }

    /// The base specification with all overlays deep-merged in, as the
    /// backend will see it.
    pub fn merged_spec(&self, overlays: &[Value]) -> Value {
        let mut spec = self.base_spec();
        for overlay in overlays {
            deep_merge(&mut spec, overlay);
        }
        spec
    }

    /// Invoke the backend with the base spec and overlays as `--file`
    /// arguments.
    pub async fn compose(&self, args: &[&str], overlays: &[Value]) -> Result<(), ComposeError> {
        let mut specs = vec![self.base_spec()];
        specs.extend_from_slice(overlays);

        // Files live until the backend has exited.
        let files = self.render_spec_files(specs)?;

        let mut command = Command::new("docker");
        command
            .arg("compose")
            .args(["--project-name", &self.project])
            .args(["--ansi", "never"])
            .args(["--progress", "plain"]);
        for file in &files {
            command.arg("--file").arg(file.path());
        }
        command.args(args);
        command.stdout(Stdio::piped()).stderr(Stdio::piped());

        tracing::info!(project = %self.project, args = ?args, "running compose backend");
        let output = command.output().await?;

        if !output.stdout.is_empty() {
            tracing::debug!(output = %String::from_utf8_lossy(&output.stdout), "compose stdout");
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ComposeError::Backend {
                status: output.status.code().unwrap_or(-1),
                stderr,
            });
        }
        if !output.stderr.is_empty() {
            tracing::debug!(output = %String::from_utf8_lossy(&output.stderr), "compose stderr");
        }
        Ok(())
    }

    /// Bring down services absent from the current spec.
    pub async fn remove_orphans(&self) -> Result<(), ComposeError> {
        self.compose(&["down", "--remove-orphans"], &[]).await
    }

    /// Start the backend's streaming event log in a child process,
    /// decoding `{action, attributes}` records into the log.
    pub async fn watch_events(&self) -> Result<(), ComposeError> {
        self.terminate_event_reader().await;

        let files = self.render_spec_files(vec![self.base_spec()])?;
        let file = match files.into_iter().next() {
            Some(file) => file,
            None => return Ok(()),
        };

        let mut child = Command::new("docker")
            .arg("compose")
            .args(["--project-name", &self.project])
            .arg("--file")
            .arg(file.path())
            .args(["events", "--json"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(async move {
                // Keep the spec file alive while the child reads it.
                let _file = file;
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let Ok(event) = serde_json::from_str::<Value>(&line) else {
                        continue;
                    };
                    let action = event["action"].as_str().unwrap_or("?");
                    let name = event["attributes"]["name"].as_str().unwrap_or("?");
                    let image = event["attributes"]["image"].as_str().unwrap_or("?");
                    tracing::info!(action = %action, name = %name, image = %image, "container event");
                }
            });
        }

        *self.event_child.lock() = Some(child);
        Ok(())
    }

    /// Kill any active event reader so its descriptors are released
    /// before a new backend invocation.
    pub async fn terminate_event_reader(&self) {
        let child = self.event_child.lock().take();
        if let Some(mut child) = child {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
    }

    fn render_spec_files(&self, mut specs: Vec<Value>) -> Result<Vec<NamedTempFile>, ComposeError> {
        specs
            .iter_mut()
            .map(|spec| {
                fix_spec(spec, &self.cwd);
                let yaml =
                    serde_yaml::to_string(spec).map_err(|e| ComposeError::Render(e.to_string()))?;
                let mut file = NamedTempFile::new()?;
                file.write_all(yaml.as_bytes())?;
                file.flush()?;
                Ok(file)
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "composer_tests.rs"]
mod tests;
