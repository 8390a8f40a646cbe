// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure deep-merge over JSON-like spec trees.
//!
//! Merge semantics: later wins for scalars, recursive merge for
//! mappings, and keyed union for lists of mappings that share a stable
//! identity field (`target`, `source`, or `name`). Other lists are
//! replaced wholesale.

use serde_json::Value;

/// Candidate identity fields for list-of-mapping union, in priority order.
const LIST_KEYS: &[&str] = &["target", "source", "name"];

/// Merge `overlay` onto `base` in place.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => {
                        base_map.insert(key.clone(), overlay_val.clone());
                    }
                }
            }
        }
        (base @ Value::Array(_), Value::Array(overlay_items)) => {
            let Some(key) = list_identity_key(base, overlay_items) else {
                *base = Value::Array(overlay_items.clone());
                return;
            };
            let Value::Array(base_items) = base else {
                return;
            };
            for overlay_item in overlay_items {
                let id = &overlay_item[key];
                match base_items.iter_mut().find(|item| &item[key] == id) {
                    Some(base_item) => deep_merge(base_item, overlay_item),
                    None => base_items.push(overlay_item.clone()),
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Find an identity field present in every mapping of both lists.
fn list_identity_key(base: &Value, overlay_items: &[Value]) -> Option<&'static str> {
    let base_items = base.as_array()?;
    let all = base_items.iter().chain(overlay_items.iter());
    let mut candidates: Vec<&'static str> = LIST_KEYS.to_vec();
    let mut any = false;
    for item in all {
        any = true;
        let map = item.as_object()?;
        candidates.retain(|k| map.contains_key(*k));
        if candidates.is_empty() {
            return None;
        }
    }
    if any {
        candidates.first().copied()
    } else {
        None
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
