// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ACL syncer entry point.
//!
//! Broker and store reconciliation are independent; a failure in one
//! does not prevent the other from running. The exit code is a bitmask:
//! bit 0 for a broker failure, bit 1 for a store failure.

use seguro_acl_syncer::{broker, load_acls, store, IGNORED_CLIENTS};
use seguro_common::{broker as cbroker, store as cstore, Config};
use std::collections::HashSet;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const BROKER_FAILED: u8 = 1;
const STORE_FAILED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    ExitCode::from(run().await)
}

async fn run() -> u8 {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return BROKER_FAILED | STORE_FAILED;
        }
    };

    let store_client = match cstore::Client::connect(&config).await {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to store");
            return BROKER_FAILED | STORE_FAILED;
        }
    };

    let acl = match load_acls(&store_client).await {
        Ok(acl) => acl,
        Err(e) => {
            tracing::error!(error = %e, "failed to load ACLs");
            return BROKER_FAILED | STORE_FAILED;
        }
    };
    tracing::info!(entities = %acl, "merged ACL catalog");

    let ignored: HashSet<String> = IGNORED_CLIENTS.iter().map(|s| s.to_string()).collect();
    let mut rc = 0;

    match cbroker::Client::connect(&config, Some("acl-syncer")).await {
        Ok(broker_client) => {
            if let Err(e) = broker::reconcile(&acl, &broker_client, &ignored).await {
                rc |= BROKER_FAILED;
                tracing::error!(error = %e, "failed to reconcile broker");
            }
            broker_client.stop().await;
        }
        Err(e) => {
            rc |= BROKER_FAILED;
            tracing::error!(error = %e, "failed to connect to broker");
        }
    }

    if let Err(e) = store::reconcile(&acl, &store_client, &ignored).await {
        rc |= STORE_FAILED;
        tracing::error!(error = %e, "failed to reconcile store");
    }

    rc
}
