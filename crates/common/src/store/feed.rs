// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bucket-notification change feed.
//!
//! The store pushes `(kind, key)` records as line-delimited JSON over a
//! long-lived HTTP response, filtered server-side to the requested
//! event kinds.

use super::client::Client;
use super::sign::{host_header, sign_request};
use crate::error::StoreError;
use seguro_core::{EventKind, EventSet};
use serde::Deserialize;
use url::Url;

impl Client {
    /// Open the notification stream for a prefix.
    pub(crate) async fn open_change_feed(
        &self,
        prefix: &str,
        events: EventSet,
    ) -> Result<reqwest::Response, StoreError> {
        let url = feed_url(&self.endpoint, &self.bucket, prefix, events)?;

        let mut request = http::Request::builder()
            .method("GET")
            .uri(url.as_str())
            .header(http::header::HOST, host_header(&url))
            .body(Vec::new())
            .map_err(|e| StoreError::Feed(e.to_string()))?;
        sign_request(&mut request, &self.credentials, &self.region)?;

        let request = reqwest::Request::try_from(request)?;
        let response = self.http.execute(request).await?;
        if !response.status().is_success() {
            return Err(StoreError::Feed(format!(
                "change feed returned {}",
                response.status()
            )));
        }
        Ok(response)
    }
}

fn feed_url(
    endpoint: &str,
    bucket: &str,
    prefix: &str,
    events: EventSet,
) -> Result<Url, StoreError> {
    let mut url = Url::parse(endpoint)?;
    url.set_path(bucket);
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("prefix", prefix);
        query.append_pair("suffix", "");
        if events.contains(EventKind::Created) {
            query.append_pair("events", "s3:ObjectCreated:*");
        }
        if events.contains(EventKind::Removed) {
            query.append_pair("events", "s3:ObjectRemoved:*");
        }
    }
    Ok(url)
}

#[derive(Deserialize)]
struct Notification {
    #[serde(rename = "Records", default)]
    records: Vec<Record>,
}

#[derive(Deserialize)]
struct Record {
    #[serde(rename = "eventName")]
    event_name: String,
    s3: RecordS3,
}

#[derive(Deserialize)]
struct RecordS3 {
    object: RecordObject,
}

#[derive(Deserialize)]
struct RecordObject {
    key: String,
}

/// Decode one feed line into `(kind, key)` tuples.
///
/// Records with an unrecognized event name are skipped; a line that is
/// not valid notification JSON is an error for the caller to log.
pub(crate) fn decode_line(line: &str) -> Result<Vec<(EventKind, String)>, StoreError> {
    let notification: Notification =
        serde_json::from_str(line).map_err(|e| StoreError::Malformed(e.to_string()))?;

    let mut decoded = Vec::with_capacity(notification.records.len());
    for record in notification.records {
        let kind = if record.event_name.starts_with("s3:ObjectCreated") {
            EventKind::Created
        } else if record.event_name.starts_with("s3:ObjectRemoved") {
            EventKind::Removed
        } else {
            tracing::debug!(event = %record.event_name, "skipping unknown event kind");
            continue;
        };
        decoded.push((kind, record.s3.object.key));
    }
    Ok(decoded)
}

/// Splits a byte stream into complete lines, buffering partial tails.
#[derive(Default)]
pub(crate) struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let rest = self.pending.split_off(pos + 1);
            let mut line = std::mem::replace(&mut self.pending, rest);
            line.pop();
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }
}

#[cfg(test)]
#[path = "feed_tests.rs"]
mod tests;
