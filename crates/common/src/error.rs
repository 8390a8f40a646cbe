// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the shared clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(String),

    #[error("change feed error: {0}")]
    Feed(String),

    #[error("malformed store response: {0}")]
    Malformed(String),

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker request failed: {0}")]
    Request(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("response channel closed")]
    Closed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
