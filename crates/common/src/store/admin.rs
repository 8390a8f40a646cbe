// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canned-policy administration against the store backend.
//!
//! Used by the ACL syncer to post per-client policy documents. The admin
//! API is not part of the S3 surface, so requests are signed directly.

use super::client::Client;
use super::sign::{host_header, sign_request};
use crate::error::StoreError;
use url::Url;

const ADMIN_BASE: &str = "/minio/admin/v3";

impl Client {
    /// Names of all canned policies on the backend.
    pub async fn admin_list_policies(&self) -> Result<Vec<String>, StoreError> {
        let response = self
            .admin_request(http::Method::GET, "list-canned-policies", &[], Vec::new())
            .await?;
        let body = response.bytes().await?;
        let policies: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(&body).map_err(|e| StoreError::Malformed(e.to_string()))?;
        Ok(policies.keys().cloned().collect())
    }

    pub async fn admin_add_policy(&self, name: &str, policy: Vec<u8>) -> Result<(), StoreError> {
        self.admin_request(
            http::Method::PUT,
            "add-canned-policy",
            &[("name", name)],
            policy,
        )
        .await?;
        Ok(())
    }

    pub async fn admin_remove_policy(&self, name: &str) -> Result<(), StoreError> {
        self.admin_request(
            http::Method::DELETE,
            "remove-canned-policy",
            &[("name", name)],
            Vec::new(),
        )
        .await?;
        Ok(())
    }

    async fn admin_request(
        &self,
        method: http::Method,
        action: &str,
        query: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<reqwest::Response, StoreError> {
        let mut url = Url::parse(&self.endpoint)?;
        url.set_path(&format!("{ADMIN_BASE}/{action}"));
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        let mut request = http::Request::builder()
            .method(method)
            .uri(url.as_str())
            .header(http::header::HOST, host_header(&url))
            .body(body)
            .map_err(|e| StoreError::Request(e.to_string()))?;
        sign_request(&mut request, &self.credentials, &self.region)?;

        let request = reqwest::Request::try_from(request)?;
        let response = self.http.execute(request).await?;
        if !response.status().is_success() {
            return Err(StoreError::Request(format!(
                "admin {action} returned {}",
                response.status()
            )));
        }
        Ok(response)
    }
}
