// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S3 object-store facade.
//!
//! Object operations go through the AWS SDK against the platform's
//! S3-compatible endpoint; the change feed and admin API are raw signed
//! HTTP requests sharing the same credentials (see `feed` and `admin`).

use crate::config::Config;
use crate::error::StoreError;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;

/// Thread-safe object-store client; cheap to clone.
#[derive(Clone)]
pub struct Client {
    pub(crate) s3: aws_sdk_s3::Client,
    pub(crate) http: reqwest::Client,
    pub(crate) bucket: String,
    pub(crate) endpoint: String,
    pub(crate) region: String,
    pub(crate) credentials: Credentials,
}

impl Client {
    /// Connect to the object store and verify the platform bucket exists.
    ///
    /// AWS credentials come from the standard environment chain; the TLS
    /// trust root and client identity come from the platform's mounted
    /// certificate paths.
    pub async fn connect(config: &Config) -> Result<Client, StoreError> {
        let endpoint = config.s3_endpoint();
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.s3_region.clone()))
            .endpoint_url(endpoint.clone())
            .load()
            .await;

        let credentials = shared
            .credentials_provider()
            .ok_or_else(|| StoreError::Request("no credentials provider configured".into()))?
            .provide_credentials()
            .await
            .map_err(|e| StoreError::Request(format!("credentials: {e}")))?;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared).force_path_style(true).build();
        let s3 = aws_sdk_s3::Client::from_conf(s3_config);

        let ca = std::fs::read(&config.tls_cacert)?;
        let mut identity_pem = std::fs::read(&config.tls_cert)?;
        identity_pem.extend(std::fs::read(&config.tls_key)?);
        let http = reqwest::Client::builder()
            .add_root_certificate(reqwest::Certificate::from_pem(&ca)?)
            .identity(reqwest::Identity::from_pem(&identity_pem)?)
            .build()?;

        let client = Client {
            s3,
            http,
            bucket: config.s3_bucket.clone(),
            endpoint,
            region: config.s3_region.clone(),
            credentials,
        };

        client
            .s3
            .head_bucket()
            .bucket(&client.bucket)
            .send()
            .await
            .map_err(|e| {
                StoreError::Request(format!(
                    "bucket {} not reachable: {}",
                    client.bucket,
                    DisplayErrorContext(e)
                ))
            })?;

        Ok(client)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// List object keys under a prefix, sorted lexicographically.
    pub async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut pages = self
            .s3
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| request_error(e))?;
            for object in page.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    pub async fn get_object(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let output = self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| request_error(e))?;
        let data = output.body.collect().await.map_err(|e| request_error(e))?;
        Ok(data.into_bytes().to_vec())
    }

    pub async fn put_object(&self, key: &str, content: Vec<u8>) -> Result<(), StoreError> {
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|e| request_error(e))?;
        Ok(())
    }

    pub async fn remove_object(&self, key: &str) -> Result<(), StoreError> {
        self.s3
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| request_error(e))?;
        Ok(())
    }

    /// Download an object to a local file.
    pub async fn get_file(&self, path: &Path, key: &str) -> Result<(), StoreError> {
        let data = self.get_object(key).await?;
        tokio::fs::write(path, data).await?;
        Ok(())
    }

    /// Upload a local file as an object.
    pub async fn put_file(&self, key: &str, path: &Path) -> Result<(), StoreError> {
        let data = tokio::fs::read(path).await?;
        self.put_object(key, data).await
    }
}

pub(crate) fn request_error<E: std::error::Error>(error: E) -> StoreError {
    StoreError::Request(format!("{}", DisplayErrorContext(error)))
}
