// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parquet frame helpers.
//!
//! Measurement recordings are stored as zstd-compressed Parquet
//! objects; these helpers move Arrow record batches in and out of the
//! store.

use super::client::Client;
use crate::error::StoreError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;

impl Client {
    /// Upload a record batch as a Parquet object.
    pub async fn put_frame(&self, key: &str, batch: &RecordBatch) -> Result<(), StoreError> {
        let properties = WriterProperties::builder()
            .set_compression(Compression::ZSTD(ZstdLevel::default()))
            .build();

        let mut buffer = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(properties))
            .map_err(|e| StoreError::Parquet(e.to_string()))?;
        writer.write(batch).map_err(|e| StoreError::Parquet(e.to_string()))?;
        writer.close().map_err(|e| StoreError::Parquet(e.to_string()))?;

        self.put_object(key, buffer).await
    }

    /// Download a Parquet object as record batches.
    pub async fn get_frame(&self, key: &str) -> Result<Vec<RecordBatch>, StoreError> {
        let data = self.get_object(key).await?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(bytes::Bytes::from(data))
            .map_err(|e| StoreError::Parquet(e.to_string()))?
            .build()
            .map_err(|e| StoreError::Parquet(e.to_string()))?;

        reader
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Parquet(e.to_string()))
    }
}
