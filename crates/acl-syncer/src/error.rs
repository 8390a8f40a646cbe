// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciler error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("unknown {kind} '{name}'")]
    DanglingReference { kind: &'static str, name: String },

    #[error("broker error: {0}")]
    Broker(#[from] seguro_common::BrokerError),

    #[error("broker command {command} failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("malformed broker response: {0}")]
    MalformedResponse(String),

    #[error("store error: {0}")]
    Store(#[from] seguro_common::StoreError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
