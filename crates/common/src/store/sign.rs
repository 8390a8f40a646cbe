// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SigV4 signing for raw store requests.
//!
//! The change feed and the admin API are MinIO extensions the AWS SDK
//! does not model, so those requests are built by hand and signed here
//! with the same credentials the SDK client uses.

use crate::error::StoreError;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    sign, PayloadChecksumKind, SignableBody, SignableRequest, SigningParams, SigningSettings,
};
use aws_sigv4::sign::v4;
use std::time::SystemTime;

/// The `host:port` form SigV4 expects in the canonical request.
pub(crate) fn host_header(url: &url::Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Sign `request` in place for the S3 service.
pub(crate) fn sign_request(
    request: &mut http::Request<Vec<u8>>,
    credentials: &Credentials,
    region: &str,
) -> Result<(), StoreError> {
    let identity = credentials.clone().into();
    let mut settings = SigningSettings::default();
    settings.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;

    let params: SigningParams = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name("s3")
        .time(SystemTime::now())
        .settings(settings)
        .build()
        .map_err(|e| StoreError::Feed(format!("signing params: {e}")))?
        .into();

    let signable = SignableRequest::new(
        request.method().as_str(),
        request.uri().to_string(),
        request
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str(), value.to_str().unwrap_or_default())),
        SignableBody::Bytes(request.body()),
    )
    .map_err(|e| StoreError::Feed(format!("signable request: {e}")))?;

    let (instructions, _signature) = sign(signable, &params)
        .map_err(|e| StoreError::Feed(format!("request signing: {e}")))?
        .into_parts();
    instructions.apply_to_request_http1x(request);

    Ok(())
}
