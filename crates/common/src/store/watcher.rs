// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellable change-feed watchers.
//!
//! A watcher is a background task reading the store's notification
//! stream. Stopping cancels the task cooperatively and drops the
//! in-flight HTTP response to unblock any pending read.

use super::client::Client;
use super::feed::{decode_line, LineBuffer};
use parking_lot::Mutex;
use seguro_core::{EventKind, EventSet};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Handle to a background watch task. `stop` is idempotent.
pub struct Watcher {
    token: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Watcher {
    pub async fn stop(&self) {
        self.token.cancel();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

/// Pull-based watch stream returned by [`Client::watch`].
pub struct EventStream {
    rx: mpsc::Receiver<(EventKind, String)>,
    watcher: Watcher,
}

impl EventStream {
    /// Next event; `None` once the watcher has been stopped and the
    /// channel drained.
    pub async fn next(&mut self) -> Option<(EventKind, String)> {
        self.rx.recv().await
    }

    pub async fn stop(&self) {
        self.watcher.stop().await;
    }
}

impl Client {
    /// Watch a key prefix, yielding `(kind, key)` tuples.
    ///
    /// With `initial` set and `CREATED` subscribed, existing keys under
    /// the prefix are replayed as synthetic created events (in
    /// lexicographic order) before any live event is delivered.
    pub fn watch(&self, prefix: &str, events: EventSet, initial: bool) -> EventStream {
        let (tx, rx) = mpsc::channel(64);
        let watcher = self.spawn_watch_loop(prefix, events, initial, tx);
        EventStream { rx, watcher }
    }

    /// Asynchronous variant: invoke `callback` for every event until the
    /// returned handle is stopped.
    pub fn watch_async<F>(&self, prefix: &str, callback: F, events: EventSet, initial: bool) -> Watcher
    where
        F: Fn(EventKind, String) + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<(EventKind, String)>(64);
        let watcher = self.spawn_watch_loop(prefix, events, initial, tx);
        tokio::spawn(async move {
            while let Some((kind, key)) = rx.recv().await {
                callback(kind, key);
            }
        });
        watcher
    }

    fn spawn_watch_loop(
        &self,
        prefix: &str,
        events: EventSet,
        initial: bool,
        tx: mpsc::Sender<(EventKind, String)>,
    ) -> Watcher {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let client = self.clone();
        let prefix = prefix.to_string();
        let handle = tokio::spawn(async move {
            client.watch_loop(prefix, events, initial, tx, task_token).await;
        });
        Watcher { token, handle: Mutex::new(Some(handle)) }
    }

    async fn watch_loop(
        self,
        prefix: String,
        events: EventSet,
        initial: bool,
        tx: mpsc::Sender<(EventKind, String)>,
        token: CancellationToken,
    ) {
        // Synthetic replay completes before any live event is delivered.
        if initial && events.contains(EventKind::Created) {
            match self.list_objects(&prefix).await {
                Ok(keys) => {
                    for key in keys {
                        if tx.send((EventKind::Created, key)).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, prefix = %prefix, "initial listing failed");
                }
            }
        }

        let mut backoff = INITIAL_BACKOFF;
        loop {
            if token.is_cancelled() {
                return;
            }

            let response = tokio::select! {
                _ = token.cancelled() => return,
                response = self.open_change_feed(&prefix, events) => response,
            };
            let mut response = match response {
                Ok(response) => {
                    backoff = INITIAL_BACKOFF;
                    response
                }
                Err(e) => {
                    tracing::warn!(error = %e, prefix = %prefix, "change feed unavailable, retrying");
                    tokio::select! {
                        _ = token.cancelled() => return,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    continue;
                }
            };

            let mut lines = LineBuffer::default();
            loop {
                let chunk = tokio::select! {
                    // Dropping the response closes the connection and
                    // unblocks the pending read.
                    _ = token.cancelled() => return,
                    chunk = response.chunk() => chunk,
                };
                match chunk {
                    Ok(Some(bytes)) => {
                        for line in lines.push(&bytes) {
                            if line.trim().is_empty() {
                                continue;
                            }
                            match decode_line(&line) {
                                Ok(records) => {
                                    for (kind, key) in records {
                                        if !events.contains(kind) {
                                            continue;
                                        }
                                        if tx.send((kind, key)).await.is_err() {
                                            return;
                                        }
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!(error = %e, "dropping malformed change-feed record");
                                }
                            }
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(prefix = %prefix, "change feed closed, resubscribing");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, prefix = %prefix, "change feed read failed, resubscribing");
                        break;
                    }
                }
            }
        }
    }
}
