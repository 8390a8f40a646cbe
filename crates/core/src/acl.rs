// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access-control documents: clients, groups, and roles.
//!
//! Documents are merged in lexicographic key order; within an entity,
//! merging unions nested lists while preserving first-seen order and
//! deduplicating by structural equality.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AclEffect {
    #[default]
    Allow,
    Deny,
}

impl AclEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            AclEffect::Allow => "Allow",
            AclEffect::Deny => "Deny",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrokerAction {
    Publish,
    Subscribe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreAction {
    #[serde(rename = "*")]
    Any,
    GetObject,
    PutObject,
    DeleteObject,
    ListObjects,
}

impl StoreAction {
    /// The action name as it appears in a store policy document.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreAction::Any => "*",
            StoreAction::GetObject => "GetObject",
            StoreAction::PutObject => "PutObject",
            StoreAction::DeleteObject => "DeleteObject",
            StoreAction::ListObjects => "ListObjects",
        }
    }
}

/// Per-statement condition map, passed through to the store backend.
pub type Condition = IndexMap<String, IndexMap<String, String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerStatement {
    #[serde(default)]
    pub effect: AclEffect,
    #[serde(default = "default_broker_actions")]
    pub actions: Vec<BrokerAction>,
    pub topic: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_broker_actions() -> Vec<BrokerAction> {
    vec![BrokerAction::Publish, BrokerAction::Subscribe]
}

fn default_priority() -> i32 {
    -1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStatement {
    #[serde(default)]
    pub effect: AclEffect,
    #[serde(default = "default_store_actions")]
    pub actions: Vec<StoreAction>,
    pub object: String,
    #[serde(default, skip_serializing_if = "Condition::is_empty")]
    pub condition: Condition,
}

fn default_store_actions() -> Vec<StoreAction> {
    vec![StoreAction::Any]
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub broker: Vec<BrokerStatement>,
    #[serde(default)]
    pub store: Vec<StoreStatement>,
}

impl Role {
    pub fn merge(&self, other: &Role) -> Role {
        Role {
            broker: union_unique(&self.broker, &other.broker),
            store: union_unique(&self.store, &other.store),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Group {
    pub fn merge(&self, other: &Group) -> Group {
        Group { roles: union_unique(&self.roles, &other.roles) }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AclClient {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl AclClient {
    pub fn merge(&self, other: &AclClient) -> AclClient {
        AclClient {
            groups: union_unique(&self.groups, &other.groups),
            roles: union_unique(&self.roles, &other.roles),
        }
    }
}

/// One parsed ACL document, or the merge of several.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccessControlList {
    #[serde(default)]
    pub clients: IndexMap<String, AclClient>,
    #[serde(default)]
    pub groups: IndexMap<String, Group>,
    #[serde(default)]
    pub roles: IndexMap<String, Role>,
}

impl AccessControlList {
    /// Merge `other` onto this list, entity by entity.
    pub fn merge(&self, other: &AccessControlList) -> AccessControlList {
        let mut merged = self.clone();

        for (name, client) in &other.clients {
            let entry = match merged.clients.get(name) {
                Some(existing) => existing.merge(client),
                None => client.clone(),
            };
            merged.clients.insert(name.clone(), entry);
        }
        for (name, group) in &other.groups {
            let entry = match merged.groups.get(name) {
                Some(existing) => existing.merge(group),
                None => group.clone(),
            };
            merged.groups.insert(name.clone(), entry);
        }
        for (name, role) in &other.roles {
            let entry = match merged.roles.get(name) {
                Some(existing) => existing.merge(role),
                None => role.clone(),
            };
            merged.roles.insert(name.clone(), entry);
        }

        merged
    }

    /// Namespace every client, group, and role name (and the references
    /// between them) with a document stem.
    pub fn prefixed(&self, stem: &str) -> AccessControlList {
        let rename = |name: &str| format!("{stem}-{name}");

        AccessControlList {
            clients: self
                .clients
                .iter()
                .map(|(name, client)| {
                    (
                        rename(name),
                        AclClient {
                            groups: client.groups.iter().map(|g| rename(g)).collect(),
                            roles: client.roles.iter().map(|r| rename(r)).collect(),
                        },
                    )
                })
                .collect(),
            groups: self
                .groups
                .iter()
                .map(|(name, group)| {
                    (
                        rename(name),
                        Group { roles: group.roles.iter().map(|r| rename(r)).collect() },
                    )
                })
                .collect(),
            roles: self.roles.iter().map(|(name, role)| (rename(name), role.clone())).collect(),
        }
    }
}

impl fmt::Display for AccessControlList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |map_keys: Vec<&String>| {
            let mut sorted: Vec<&str> = map_keys.into_iter().map(String::as_str).collect();
            sorted.sort_unstable();
            sorted.join(", ")
        };
        write!(
            f,
            "clients=[{}] groups=[{}] roles=[{}]",
            names(self.clients.keys().collect()),
            names(self.groups.keys().collect()),
            names(self.roles.keys().collect()),
        )
    }
}

/// Union of two lists preserving first-seen order, deduplicated by
/// structural equality.
fn union_unique<T: PartialEq + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(a.len() + b.len());
    for item in a.iter().chain(b.iter()) {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

#[cfg(test)]
#[path = "acl_tests.rs"]
mod tests;
