// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store policy reconciliation.
//!
//! Each client's effective store statements (direct roles plus the
//! roles of its groups) are rendered as a policy document and posted
//! under the client's name. Policies absent from the desired set are
//! removed, except for the ignored principals.

use crate::error::ReconcileError;
use indexmap::IndexMap;
use seguro_common::store;
use seguro_core::acl::{AccessControlList, AclClient};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statement: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyStatement {
    #[serde(rename = "Effect")]
    pub effect: String,
    #[serde(rename = "Action")]
    pub action: Vec<String>,
    #[serde(rename = "Resource")]
    pub resource: String,
}

/// Render one policy document per client.
pub fn policies_from_acl(
    acl: &AccessControlList,
) -> Result<IndexMap<String, PolicyDocument>, ReconcileError> {
    acl.clients
        .iter()
        .map(|(name, client)| Ok((name.clone(), policy_for_client(acl, client)?)))
        .collect()
}

/// Resolve a client's effective store statements, raising on a
/// dangling group or role reference.
pub fn policy_for_client(
    acl: &AccessControlList,
    client: &AclClient,
) -> Result<PolicyDocument, ReconcileError> {
    let mut role_names: Vec<&str> = client.roles.iter().map(String::as_str).collect();

    for group_name in &client.groups {
        let group = acl.groups.get(group_name).ok_or_else(|| {
            ReconcileError::DanglingReference { kind: "group", name: group_name.clone() }
        })?;
        role_names.extend(group.roles.iter().map(String::as_str));
    }

    let mut statement = Vec::new();
    for role_name in role_names {
        let role = acl.roles.get(role_name).ok_or_else(|| {
            ReconcileError::DanglingReference { kind: "role", name: role_name.to_string() }
        })?;
        for stm in &role.store {
            statement.push(PolicyStatement {
                effect: stm.effect.as_str().to_string(),
                action: stm.actions.iter().map(|a| format!("s3:{}", a.as_str())).collect(),
                resource: format!("arn:aws:s3:::{}", stm.object),
            });
        }
    }

    Ok(PolicyDocument { version: POLICY_VERSION.to_string(), statement })
}

/// Reconcile the store's canned policies against the merged ACL.
pub async fn reconcile(
    acl: &AccessControlList,
    client: &store::Client,
    ignored: &HashSet<String>,
) -> Result<(), ReconcileError> {
    let existing = client.admin_list_policies().await?;
    let desired = policies_from_acl(acl)?;

    let mut removed: Vec<String> = existing
        .iter()
        .filter(|name| !desired.contains_key(*name) && !ignored.contains(*name))
        .cloned()
        .collect();
    // Policies that became empty are removed rather than updated.
    removed.extend(
        desired
            .iter()
            .filter(|(name, policy)| policy.statement.is_empty() && existing.contains(name))
            .map(|(name, _)| name.clone()),
    );

    for name in &removed {
        client.admin_remove_policy(name).await?;
        tracing::info!(policy = %name, "removed store policy");
    }

    for (name, policy) in &desired {
        if policy.statement.is_empty() {
            tracing::warn!(policy = %name, "ignoring store policy without any statements");
            continue;
        }
        client.admin_add_policy(name, serde_json::to_vec(policy)?).await?;
        tracing::info!(policy = %name, "updated store policy");
    }

    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
