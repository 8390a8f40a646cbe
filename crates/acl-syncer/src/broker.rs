// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broker dynamic-security reconciliation.
//!
//! Translates merged ACL roles into the broker's native ACL shapes,
//! diffs them against the live configuration, and submits the minimal
//! command batch on the dynamic-security control topic.

use crate::error::ReconcileError;
use indexmap::IndexMap;
use seguro_core::acl::{AccessControlList, AclEffect, BrokerAction};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

pub const CONTROL_TOPIC: &str = "$CONTROL/dynamic-security/v1";
pub const RESPONSE_TOPIC: &str = "$CONTROL/dynamic-security/v1/response";

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AclType {
    PublishClientSend,
    PublishClientReceive,
    SubscribeLiteral,
    SubscribePattern,
    UnsubscribeLiteral,
    UnsubscribePattern,
}

impl AclType {
    /// Broker ACL shapes for one declared action.
    fn from_broker_action(action: BrokerAction) -> Vec<AclType> {
        match action {
            BrokerAction::Publish => vec![AclType::PublishClientSend],
            BrokerAction::Subscribe => vec![
                AclType::SubscribePattern,
                AclType::UnsubscribePattern,
                AclType::PublishClientReceive,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    pub acltype: AclType,
    pub topic: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub allow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    pub rolename: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub groupname: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    -1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerClient {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clientid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textdescription: Option<String>,
    #[serde(default)]
    pub groups: Vec<GroupRef>,
    #[serde(default)]
    pub roles: Vec<RoleRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerGroup {
    pub groupname: String,
    #[serde(default)]
    pub roles: Vec<RoleRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerRole {
    pub rolename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textdescription: Option<String>,
    #[serde(default)]
    pub acls: Vec<Acl>,
}

impl BrokerClient {
    /// Canonical field order so diffs are order-insensitive.
    fn normalize(mut self) -> BrokerClient {
        self.groups.sort_by(|a, b| a.groupname.cmp(&b.groupname));
        self.roles.sort_by(|a, b| a.rolename.cmp(&b.rolename));
        self
    }
}

impl BrokerGroup {
    fn normalize(mut self) -> BrokerGroup {
        self.roles.sort_by(|a, b| a.rolename.cmp(&b.rolename));
        self
    }
}

impl BrokerRole {
    fn normalize(mut self) -> BrokerRole {
        self.acls
            .sort_by(|a, b| (&a.topic, a.acltype, a.priority).cmp(&(&b.topic, b.acltype, b.priority)));
        self
    }
}

/// A dynamic-security configuration: the desired or live set of
/// clients, groups, and roles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub clients: IndexMap<String, BrokerClient>,
    pub groups: IndexMap<String, BrokerGroup>,
    pub roles: IndexMap<String, BrokerRole>,
}

impl Config {
    /// Translate a merged ACL into broker shapes.
    pub fn from_acl(acl: &AccessControlList) -> Config {
        let clients = acl
            .clients
            .iter()
            .map(|(name, client)| {
                let entry = BrokerClient {
                    username: name.clone(),
                    clientid: None,
                    textname: None,
                    textdescription: None,
                    groups: client
                        .groups
                        .iter()
                        .map(|g| GroupRef { groupname: g.clone(), priority: -1 })
                        .collect(),
                    roles: client
                        .roles
                        .iter()
                        .map(|r| RoleRef { rolename: r.clone(), priority: -1 })
                        .collect(),
                }
                .normalize();
                (name.clone(), entry)
            })
            .collect();

        let groups = acl
            .groups
            .iter()
            .map(|(name, group)| {
                let entry = BrokerGroup {
                    groupname: name.clone(),
                    roles: group
                        .roles
                        .iter()
                        .map(|r| RoleRef { rolename: r.clone(), priority: -1 })
                        .collect(),
                }
                .normalize();
                (name.clone(), entry)
            })
            .collect();

        let roles = acl
            .roles
            .iter()
            .map(|(name, role)| {
                let mut acls = Vec::new();
                for statement in &role.broker {
                    for action in &statement.actions {
                        for acltype in AclType::from_broker_action(*action) {
                            acls.push(Acl {
                                acltype,
                                topic: statement.topic.clone(),
                                priority: statement.priority,
                                allow: statement.effect == AclEffect::Allow,
                            });
                        }
                    }
                }
                let entry = BrokerRole {
                    rolename: name.clone(),
                    textname: None,
                    textdescription: None,
                    acls,
                }
                .normalize();
                (name.clone(), entry)
            })
            .collect();

        Config { clients, groups, roles }
    }

    /// Entries present here but absent from `other`.
    pub fn not_in(&self, other: &Config) -> Config {
        Config {
            clients: self
                .clients
                .iter()
                .filter(|(name, _)| !other.clients.contains_key(*name))
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect(),
            groups: self
                .groups
                .iter()
                .filter(|(name, _)| !other.groups.contains_key(*name))
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect(),
            roles: self
                .roles
                .iter()
                .filter(|(name, _)| !other.roles.contains_key(*name))
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect(),
        }
    }

    /// Entries present in both, with this config's values.
    pub fn also_in(&self, other: &Config) -> Config {
        Config {
            clients: self
                .clients
                .iter()
                .filter(|(name, _)| other.clients.contains_key(*name))
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect(),
            groups: self
                .groups
                .iter()
                .filter(|(name, _)| other.groups.contains_key(*name))
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect(),
            roles: self
                .roles
                .iter()
                .filter(|(name, _)| other.roles.contains_key(*name))
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect(),
        }
    }

    /// Entries structurally equal in both configs.
    pub fn equal_to(&self, other: &Config) -> Config {
        Config {
            clients: self
                .clients
                .iter()
                .filter(|(name, value)| other.clients.get(*name) == Some(value))
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect(),
            groups: self
                .groups
                .iter()
                .filter(|(name, value)| other.groups.get(*name) == Some(value))
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect(),
            roles: self
                .roles
                .iter()
                .filter(|(name, value)| other.roles.get(*name) == Some(value))
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect(),
        }
    }

    /// The closure of the named clients: the clients themselves, the
    /// groups they belong to, and every role reachable directly or
    /// through those groups.
    pub fn belonging_to(&self, client_names: &HashSet<String>) -> Config {
        let clients: IndexMap<String, BrokerClient> = self
            .clients
            .iter()
            .filter(|(name, _)| client_names.contains(*name))
            .map(|(n, v)| (n.clone(), v.clone()))
            .collect();

        let mut groups = IndexMap::new();
        let mut roles = IndexMap::new();
        for client in clients.values() {
            let mut role_names: Vec<String> =
                client.roles.iter().map(|r| r.rolename.clone()).collect();

            for group_ref in &client.groups {
                let Some(group) = self.groups.get(&group_ref.groupname) else {
                    continue;
                };
                role_names.extend(group.roles.iter().map(|r| r.rolename.clone()));
                groups.insert(group_ref.groupname.clone(), group.clone());
            }

            for role_name in role_names {
                if let Some(role) = self.roles.get(&role_name) {
                    roles.insert(role_name, role.clone());
                }
            }
        }

        Config { clients, groups, roles }
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty() && self.groups.is_empty() && self.roles.is_empty()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |keys: Vec<&String>| {
            let mut sorted: Vec<&str> = keys.into_iter().map(String::as_str).collect();
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

/// One dynamic-security command, tagged by its `command` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    CreateRole(BrokerRole),
    ModifyRole(BrokerRole),
    DeleteRole { rolename: String },
    CreateGroup(BrokerGroup),
    ModifyGroup(BrokerGroup),
    DeleteGroup { groupname: String },
    CreateClient(BrokerClient),
    ModifyClient(BrokerClient),
    DeleteClient { username: String },
    ListClients { verbose: bool, count: i64, offset: i64 },
    ListGroups { verbose: bool, count: i64, offset: i64 },
    ListRoles { verbose: bool, count: i64, offset: i64 },
    #[serde(rename = "setDefaultACLAccess")]
    SetDefaultAclAccess { acls: Vec<DefaultAclEntry> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultAclEntry {
    pub acltype: AclType,
    pub allow: bool,
}

impl Command {
    fn list_clients() -> Command {
        Command::ListClients { verbose: true, count: -1, offset: 0 }
    }

    fn list_groups() -> Command {
        Command::ListGroups { verbose: true, count: -1, offset: 0 }
    }

    fn list_roles() -> Command {
        Command::ListRoles { verbose: true, count: -1, offset: 0 }
    }
}

/// Compute the minimal command batch driving `current` toward
/// `desired`, leaving the ignored principals untouched.
///
/// Create and modify commands are ordered roles, groups, clients;
/// deletes the other way around, so references always resolve.
pub fn plan(desired: &Config, current: &Config, ignored: &HashSet<String>) -> Vec<Command> {
    let desired = desired.not_in(&desired.belonging_to(ignored));
    let current = current.not_in(&current.belonging_to(ignored));

    let unchanged = desired.equal_to(&current);
    let modify = desired.also_in(&current).not_in(&unchanged);
    let create = desired.not_in(&current);
    let delete = current.not_in(&desired);

    let mut commands = Vec::new();

    for (name, role) in &create.roles {
        tracing::info!(role = %name, "create broker role");
        commands.push(Command::CreateRole(role.clone()));
    }
    for (name, group) in &create.groups {
        tracing::info!(group = %name, "create broker group");
        commands.push(Command::CreateGroup(group.clone()));
    }
    for (name, client) in &create.clients {
        tracing::info!(client = %name, "create broker client");
        commands.push(Command::CreateClient(client.clone()));
    }

    for (name, role) in &modify.roles {
        tracing::info!(role = %name, "modify broker role");
        commands.push(Command::ModifyRole(role.clone()));
    }
    for (name, group) in &modify.groups {
        tracing::info!(group = %name, "modify broker group");
        commands.push(Command::ModifyGroup(group.clone()));
    }
    for (name, client) in &modify.clients {
        tracing::info!(client = %name, "modify broker client");
        commands.push(Command::ModifyClient(client.clone()));
    }

    for name in delete.clients.keys() {
        tracing::info!(client = %name, "delete broker client");
        commands.push(Command::DeleteClient { username: name.clone() });
    }
    for name in delete.groups.keys() {
        tracing::info!(group = %name, "delete broker group");
        commands.push(Command::DeleteGroup { groupname: name.clone() });
    }
    for name in delete.roles.keys() {
        tracing::info!(role = %name, "delete broker role");
        commands.push(Command::DeleteRole { rolename: name.clone() });
    }

    commands
}

#[derive(Debug, Deserialize)]
struct ResponseBatch {
    #[serde(default)]
    responses: Vec<CommandResponse>,
}

#[derive(Debug, Deserialize)]
pub struct CommandResponse {
    pub command: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Facade over the dynamic-security control topic.
pub struct Dynsec<'a> {
    broker: &'a seguro_common::broker::Client,
}

impl<'a> Dynsec<'a> {
    pub fn new(broker: &'a seguro_common::broker::Client) -> Dynsec<'a> {
        Dynsec { broker }
    }

    /// Submit a command batch and correlate the response stream by
    /// sequence. The first failed response aborts.
    pub async fn execute(
        &self,
        commands: &[Command],
    ) -> Result<Vec<CommandResponse>, ReconcileError> {
        let payload = serde_json::to_vec(&json!({ "commands": commands }))?;
        let raw = self
            .broker
            .request(CONTROL_TOPIC, RESPONSE_TOPIC, payload, RESPONSE_TIMEOUT)
            .await?;

        let batch: ResponseBatch = serde_json::from_slice(&raw)
            .map_err(|e| ReconcileError::MalformedResponse(e.to_string()))?;
        if batch.responses.len() != commands.len() {
            tracing::warn!(
                sent = commands.len(),
                received = batch.responses.len(),
                "response count does not match command batch"
            );
        }
        for response in &batch.responses {
            if let Some(message) = &response.error {
                return Err(ReconcileError::CommandFailed {
                    command: response.command.clone(),
                    message: message.clone(),
                });
            }
        }
        Ok(batch.responses)
    }

    /// Enumerate live clients, groups, and roles.
    pub async fn current_config(&self) -> Result<Config, ReconcileError> {
        let responses = self
            .execute(&[Command::list_clients(), Command::list_groups(), Command::list_roles()])
            .await?;

        let mut config = Config::default();
        for response in responses {
            match response.command.as_str() {
                "listClients" => {
                    let clients: Vec<BrokerClient> = decode_list(&response, "clients")?;
                    for client in clients {
                        let client = client.normalize();
                        config.clients.insert(client.username.clone(), client);
                    }
                }
                "listGroups" => {
                    let groups: Vec<BrokerGroup> = decode_list(&response, "groups")?;
                    for group in groups {
                        let group = group.normalize();
                        config.groups.insert(group.groupname.clone(), group);
                    }
                }
                "listRoles" => {
                    let roles: Vec<BrokerRole> = decode_list(&response, "roles")?;
                    for role in roles {
                        let role = role.normalize();
                        config.roles.insert(role.rolename.clone(), role);
                    }
                }
                other => {
                    tracing::warn!(command = %other, "unexpected response in listing batch");
                }
            }
        }
        Ok(config)
    }
}

fn decode_list<T: serde::de::DeserializeOwned>(
    response: &CommandResponse,
    field: &str,
) -> Result<Vec<T>, ReconcileError> {
    serde_json::from_value(response.data.get(field).cloned().unwrap_or_default())
        .map_err(|e| ReconcileError::MalformedResponse(format!("{}: {e}", response.command)))
}

/// Reconcile the broker's dynamic-security state against the merged ACL.
pub async fn reconcile(
    acl: &AccessControlList,
    broker: &seguro_common::broker::Client,
    ignored: &HashSet<String>,
) -> Result<(), ReconcileError> {
    let dynsec = Dynsec::new(broker);

    let desired = Config::from_acl(acl);
    let current = dynsec.current_config().await?;
    tracing::info!(desired = %desired, current = %current, "broker ACL state");

    let commands = plan(&desired, &current, ignored);
    if commands.is_empty() {
        tracing::info!("broker ACLs already converged");
        return Ok(());
    }

    dynsec.execute(&commands).await?;
    tracing::info!(commands = commands.len(), "updated broker configuration");
    Ok(())
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
