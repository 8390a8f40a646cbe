// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn acl(yaml: &str) -> AccessControlList {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn policy_renders_statements() {
    let acl = acl(concat!(
        "clients:\n  gateway:\n    roles: [writer]\n",
        "roles:\n",
        "  writer:\n",
        "    store:\n",
        "      - object: data/*\n",
        "        actions: [PutObject, ListObjects]\n",
        "      - object: secret/*\n",
        "        actions: ['*']\n",
        "        effect: Deny\n",
    ));

    let policy = policy_for_client(&acl, &acl.clients["gateway"]).unwrap();
    assert_eq!(policy.version, POLICY_VERSION);
    assert_eq!(policy.statement.len(), 2);

    assert_eq!(policy.statement[0].effect, "Allow");
    assert_eq!(policy.statement[0].action, vec!["s3:PutObject", "s3:ListObjects"]);
    assert_eq!(policy.statement[0].resource, "arn:aws:s3:::data/*");

    assert_eq!(policy.statement[1].effect, "Deny");
    assert_eq!(policy.statement[1].action, vec!["s3:*"]);
}

#[test]
fn group_roles_contribute_statements() {
    let acl = acl(concat!(
        "clients:\n  gateway:\n    groups: [devices]\n",
        "groups:\n  devices:\n    roles: [reader]\n",
        "roles:\n  reader:\n    store:\n      - object: data/*\n        actions: [GetObject]\n",
    ));

    let policy = policy_for_client(&acl, &acl.clients["gateway"]).unwrap();
    assert_eq!(policy.statement.len(), 1);
    assert_eq!(policy.statement[0].action, vec!["s3:GetObject"]);
}

#[test]
fn dangling_group_is_an_error() {
    let acl = acl("clients:\n  gateway:\n    groups: [ghost]\n");
    let err = policy_for_client(&acl, &acl.clients["gateway"]).unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::DanglingReference { kind: "group", .. }
    ));
}

#[test]
fn dangling_role_is_an_error() {
    let acl = acl("clients:\n  gateway:\n    roles: [ghost]\n");
    let err = policy_for_client(&acl, &acl.clients["gateway"]).unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::DanglingReference { kind: "role", .. }
    ));
}

#[test]
fn dangling_reference_fails_the_whole_batch() {
    let acl = acl(concat!(
        "clients:\n",
        "  good:\n    roles: [reader]\n",
        "  bad:\n    roles: [ghost]\n",
        "roles:\n  reader: {}\n",
    ));
    assert!(policies_from_acl(&acl).is_err());
}

#[test]
fn client_without_roles_gets_empty_policy() {
    let acl = acl("clients:\n  idle: {}\n");
    let policies = policies_from_acl(&acl).unwrap();
    assert!(policies["idle"].statement.is_empty());
}

#[test]
fn policy_document_json_shape() {
    let acl = acl(concat!(
        "clients:\n  gateway:\n    roles: [reader]\n",
        "roles:\n  reader:\n    store:\n      - object: x/*\n        actions: [GetObject]\n",
    ));
    let policy = policy_for_client(&acl, &acl.clients["gateway"]).unwrap();

    let value = serde_json::to_value(&policy).unwrap();
    assert_eq!(value["Version"], "2012-10-17");
    assert_eq!(value["Statement"][0]["Effect"], "Allow");
    assert_eq!(value["Statement"][0]["Action"][0], "s3:GetObject");
    assert_eq!(value["Statement"][0]["Resource"], "arn:aws:s3:::x/*");
}
