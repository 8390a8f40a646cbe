// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A named service managed through the composer.

use crate::composer::{ComposeError, Composer};
use serde_json::Value;

/// Launch parameters for one compose service.
#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    pub spec: Value,
    pub scale: u32,
    pub force_recreate: bool,
    pub build: bool,
}

impl Service {
    /// Bring the service up, detached, with the given overlay specs.
    pub async fn start(&self, composer: &Composer, overlays: &[Value]) -> Result<(), ComposeError> {
        composer.terminate_event_reader().await;

        let args = self.up_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        composer.compose(&args, overlays).await
    }

    /// Take the service down.
    pub async fn stop(&self, composer: &Composer) -> Result<(), ComposeError> {
        composer.compose(&["down", &self.name], &[]).await
    }

    fn up_args(&self) -> Vec<String> {
        let mut args: Vec<String> =
            vec!["up".into(), "--detach".into(), "--quiet-pull".into()];
        if self.scale > 1 {
            args.push("--scale".into());
            args.push(format!("{}={}", self.name, self.scale));
        }
        if self.force_recreate {
            args.push("--force-recreate".into());
        }
        if self.build {
            args.push("--build".into());
        }
        args.push(self.name.clone());
        args
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
