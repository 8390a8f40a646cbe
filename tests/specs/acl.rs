// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ACL catalog scenarios: tenant merging and broker convergence.

use seguro_acl_syncer::broker::{plan, Command, Config};
use seguro_acl_syncer::catalog::merge_documents;
use seguro_core::acl::StoreAction;
use std::collections::HashSet;

fn doc(key: &str, yaml: &str) -> (String, Vec<u8>) {
    (key.to_string(), yaml.as_bytes().to_vec())
}

#[test]
fn tenant_prefixing_keeps_same_named_roles_distinct() {
    // Two tenants both define a role `reader` over `x/*` with different
    // actions; after stem prefixing neither leaks into the other.
    let merged = merge_documents(&[
        doc(
            "config/acls/a.yaml",
            "roles:\n  reader:\n    store:\n      - object: x/*\n        actions: [GetObject]\n",
        ),
        doc(
            "config/acls/b.yaml",
            "roles:\n  reader:\n    store:\n      - object: x/*\n        actions: [ListObjects]\n",
        ),
    ]);

    assert_eq!(merged.roles.len(), 2);
    assert_eq!(merged.roles["a-reader"].store.len(), 1);
    assert_eq!(merged.roles["a-reader"].store[0].actions, vec![StoreAction::GetObject]);
    assert_eq!(merged.roles["b-reader"].store.len(), 1);
    assert_eq!(merged.roles["b-reader"].store[0].actions, vec![StoreAction::ListObjects]);
}

#[test]
fn broker_reconcile_converges_in_one_round() {
    // One client, one group, two roles against an empty broker: four
    // create commands on the first run, none on the second.
    let merged = merge_documents(&[doc(
        "config/acls/site.yaml",
        concat!(
            "clients:\n  gateway:\n    groups: [devices]\n",
            "groups:\n  devices:\n    roles: [reader, writer]\n",
            "roles:\n",
            "  reader:\n    broker:\n      - topic: data/#\n        actions: [Subscribe]\n",
            "  writer:\n    broker:\n      - topic: data/#\n        actions: [Publish]\n",
        ),
    )]);

    let desired = Config::from_acl(&merged);
    let ignored = HashSet::new();

    let first = plan(&desired, &Config::default(), &ignored);
    assert_eq!(first.len(), 4);
    assert!(matches!(first[0], Command::CreateRole(_)));
    assert!(matches!(first[1], Command::CreateRole(_)));
    assert!(matches!(first[2], Command::CreateGroup(_)));
    assert!(matches!(first[3], Command::CreateClient(_)));

    // The broker now holds exactly the desired state.
    let second = plan(&desired, &desired.clone(), &ignored);
    assert!(second.is_empty());
}

#[test]
fn document_order_is_lexicographic_by_stem() {
    // Both orderings of the same documents merge identically because
    // the loader sorts by key before merging.
    let a = doc("config/acls/a.yaml", "groups:\n  g:\n    roles: [r1]\n");
    let b = doc("config/acls/b.yaml", "groups:\n  g:\n    roles: [r2]\n");

    let forward = merge_documents(&[a.clone(), b.clone()]);
    let mut reversed_docs = vec![b, a];
    reversed_docs.sort_by(|x, y| x.0.cmp(&y.0));
    let reversed = merge_documents(&reversed_docs);

    assert_eq!(forward, reversed);
}
