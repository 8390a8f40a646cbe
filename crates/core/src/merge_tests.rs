// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn scalars_later_wins() {
    let mut base = json!({"image": "busybox", "scale": 1});
    deep_merge(&mut base, &json!({"scale": 3}));
    assert_eq!(base, json!({"image": "busybox", "scale": 3}));
}

#[test]
fn mappings_merge_recursively() {
    let mut base = json!({"services": {"a": {"image": "busybox", "environment": {"X": "1"}}}});
    deep_merge(
        &mut base,
        &json!({"services": {"a": {"environment": {"Y": "2"}}, "b": {"image": "alpine"}}}),
    );
    assert_eq!(
        base,
        json!({
            "services": {
                "a": {"image": "busybox", "environment": {"X": "1", "Y": "2"}},
                "b": {"image": "alpine"},
            }
        })
    );
}

#[test]
fn keyed_lists_union_by_target() {
    let mut base = json!({"volumes": [
        {"target": "/certs", "source": "certs", "read_only": true},
    ]});
    deep_merge(
        &mut base,
        &json!({"volumes": [
            {"target": "/certs", "source": "other"},
            {"target": "/keys", "source": "keys"},
        ]}),
    );
    assert_eq!(
        base,
        json!({"volumes": [
            {"target": "/certs", "source": "other", "read_only": true},
            {"target": "/keys", "source": "keys"},
        ]})
    );
}

#[test]
fn scalar_lists_are_replaced() {
    let mut base = json!({"command": ["echo", "hi"]});
    deep_merge(&mut base, &json!({"command": ["true"]}));
    assert_eq!(base, json!({"command": ["true"]}));
}

#[test]
fn mixed_lists_without_common_key_are_replaced() {
    let mut base = json!({"items": [{"target": "/a"}]});
    deep_merge(&mut base, &json!({"items": [{"name": "b"}]}));
    assert_eq!(base, json!({"items": [{"name": "b"}]}));
}

#[test]
fn empty_overlay_is_identity() {
    let mut base = json!({"services": {"a": {"image": "busybox"}}});
    let before = base.clone();
    deep_merge(&mut base, &json!({}));
    assert_eq!(base, before);
}

#[test]
fn overlay_introduces_new_sections() {
    let mut base = json!({"services": {}});
    deep_merge(&mut base, &json!({"networks": {"default": {"external": true}}}));
    assert_eq!(
        base,
        json!({"services": {}, "networks": {"default": {"external": true}}})
    );
}
