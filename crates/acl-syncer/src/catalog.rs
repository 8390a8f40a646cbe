// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ACL document loading and merging.
//!
//! One YAML document per tenant under the ACL prefix. Documents are
//! applied in lexicographic key order; each document's entity names are
//! prefixed with its stem to namespace tenants. A malformed document is
//! skipped without affecting the others.

use crate::error::ReconcileError;
use seguro_common::store;
use seguro_core::AccessControlList;

pub const ACL_PREFIX: &str = "config/acls/";

/// Load, prefix, and merge every ACL document under the prefix.
pub async fn load_acls(client: &store::Client) -> Result<AccessControlList, ReconcileError> {
    let keys = client.list_objects(ACL_PREFIX).await?;

    let mut documents = Vec::with_capacity(keys.len());
    for key in keys {
        let contents = client.get_object(&key).await?;
        documents.push((key, contents));
    }

    Ok(merge_documents(&documents))
}

/// Merge already-fetched documents, assumed sorted by key.
pub fn merge_documents(documents: &[(String, Vec<u8>)]) -> AccessControlList {
    let mut merged = AccessControlList::default();

    for (key, contents) in documents {
        let stem = document_stem(key);
        match serde_yaml::from_slice::<AccessControlList>(contents) {
            Ok(acl) => {
                tracing::info!(acl = %stem, entities = %acl, "loaded ACL");
                merged = merged.merge(&acl.prefixed(stem));
            }
            Err(e) => {
                tracing::error!(acl = %stem, error = %e, "ignoring malformed ACL");
            }
        }
    }

    merged
}

fn document_stem(key: &str) -> &str {
    let filename = key.rsplit('/').next().unwrap_or(key);
    filename.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(filename)
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
