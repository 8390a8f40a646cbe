// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level scenario tests.

#[path = "specs/acl.rs"]
mod acl;
#[path = "specs/job_info.rs"]
mod job_info;
#[path = "specs/schedule.rs"]
mod schedule;
