// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("store error: {0}")]
    Store(#[from] seguro_common::StoreError),

    #[error("compose backend error: {0}")]
    Compose(#[from] seguro_compose::ComposeError),

    #[error("invalid schedule: {0}")]
    Schedule(#[from] seguro_core::ScheduleSpecError),

    #[error("failed to serialize job info: {0}")]
    JobInfo(#[from] serde_json::Error),
}
