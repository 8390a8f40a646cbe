// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object-store client and change-feed watcher.

mod admin;
mod client;
mod feed;
mod frame;
mod sign;
mod watcher;

pub use client::Client;
pub use watcher::{EventStream, Watcher};
