// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compose spec fixups applied before rendering.

use serde_json::{json, Value};
use std::path::Path;

/// The platform's default external network, attached to every launched
/// service.
pub fn default_networks() -> Value {
    json!({
        "default": {
            "name": "platform_default",
            "external": true,
        }
    })
}

/// Normalize a spec tree for the backend.
///
/// Rewrites relative `env_file` entries to absolute paths: the backend
/// resolves them relative to the rendered spec's location, which is a
/// temp path, not the scheduler's working directory. Networks flagged
/// external get their canonical external name so the backend does not
/// try to create them.
pub fn fix_spec(spec: &mut Value, cwd: &Path) {
    if let Some(services) = spec.get_mut("services").and_then(Value::as_object_mut) {
        for service in services.values_mut() {
            let Some(env_file) = service.get_mut("env_file") else {
                continue;
            };
            match env_file {
                Value::String(path) => *path = absolutize(path, cwd),
                Value::Array(entries) => {
                    for entry in entries {
                        if let Value::String(path) = entry {
                            *path = absolutize(path, cwd);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(networks) = spec.get_mut("networks").and_then(Value::as_object_mut) {
        for network in networks.values_mut() {
            let Some(map) = network.as_object_mut() else {
                continue;
            };
            // Legacy `external: {name: ...}` form; the bool form is
            // already canonical.
            let Some(Value::Object(external)) = map.get("external") else {
                continue;
            };
            let name = external
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("default")
                .to_string();
            map.insert("name".to_string(), Value::String(name));
            map.insert("external".to_string(), Value::Bool(true));
        }
    }
}

fn absolutize(path: &str, cwd: &Path) -> String {
    let p = Path::new(path);
    if p.is_absolute() {
        path.to_string()
    } else {
        cwd.join(p).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
