// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-driven platform configuration.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Connection settings shared by all platform services.
///
/// Values come from the process environment, with a `.env` file in the
/// working directory loaded first.
#[derive(Debug, Clone)]
pub struct Config {
    pub s3_host: String,
    pub s3_port: u16,
    pub s3_region: String,
    pub s3_bucket: String,

    pub mqtt_host: String,
    pub mqtt_port: u16,

    pub tls_cacert: PathBuf,
    pub tls_cert: PathBuf,
    pub tls_key: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        dotenv::dotenv().ok();

        Ok(Config {
            s3_host: env_or("S3_HOST", "localhost"),
            s3_port: env_port("S3_PORT", 9000)?,
            s3_region: env_or("S3_REGION", "minio"),
            s3_bucket: env_or("S3_BUCKET", "seguro"),
            mqtt_host: env_or("MQTT_HOST", "localhost"),
            mqtt_port: env_port("MQTT_PORT", 8883)?,
            tls_cacert: env_or("TLS_CACERT", "keys/ca.crt").into(),
            tls_cert: env_or("TLS_CERT", "keys/clients/admin.crt").into(),
            tls_key: env_or("TLS_KEY", "keys/clients/admin.key").into(),
        })
    }

    pub fn s3_endpoint(&self) -> String {
        format!("https://{}:{}", self.s3_host, self.s3_port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_port(key: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
