//! Data store operations for LocalDb.

use super::LocalDb;
use crate::{
    db::{Record, TransactionMode, Value},
    error::{Result, StoreError},
    schema::DB_DATA_STORE_NAME,
};

impl LocalDb {
    /// Appends a chunk and returns its assigned key.
    ///
    /// Keys increase with every append, so chunks appended one after another
    /// by a single writer get consecutive keys.
    pub async fn append_chunk(&self, bytes: Vec<u8>) -> Result<u64> {
        self.data_store(TransactionMode::ReadWrite, move |store| {
            store.add(Value::Blob(bytes))
        })
        .await
    }

    /// Reads the chunk stored under `id`.
    pub async fn read_chunk(&self, id: u64) -> Result<Option<Vec<u8>>> {
        let record = self
            .data_store(TransactionMode::ReadOnly, move |store| store.get(id))
            .await?;
        record.map(decode_chunk).transpose()
    }

    /// Reads `count` chunks starting at `start_id`, one after another.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MissingChunk` for the first key in the run with
    /// no chunk.
    pub async fn read_run(&self, start_id: u64, count: u64) -> Result<Vec<Vec<u8>>> {
        let mut run = self.chunk_run(start_id, count);
        let mut chunks = Vec::new();
        while let Some(chunk) = run.next_chunk().await {
            chunks.push(chunk?);
        }
        Ok(chunks)
    }

    /// Lazily reads `count` chunks starting at `start_id`.
    pub fn chunk_run(&self, start_id: u64, count: u64) -> ChunkRun {
        ChunkRun {
            db: self.clone(),
            next: start_id,
            end: start_id.saturating_add(count),
        }
    }

    /// Deletes `count` chunks starting at `start_id` in one transaction;
    /// returns how many existed.
    pub async fn delete_chunks(&self, start_id: u64, count: u64) -> Result<u64> {
        self.data_store(TransactionMode::ReadWrite, move |store| {
            let mut deleted = 0;
            for id in start_id..start_id.saturating_add(count) {
                if store.delete(id)? {
                    deleted += 1;
                }
            }
            Ok(deleted)
        })
        .await
    }

    /// Removes every chunk; returns how many were removed.
    pub async fn clear_data(&self) -> Result<usize> {
        self.data_store(TransactionMode::ReadWrite, |store| store.clear())
            .await
    }

    /// Number of chunks in the data store.
    pub async fn count_chunks(&self) -> Result<u64> {
        self.data_store(TransactionMode::ReadOnly, |store| store.count())
            .await
    }
}

/// A run of consecutive chunks read one key at a time.
///
/// Each read is issued only after the previous one completes, so a consumer
/// holds at most one chunk in memory.
#[derive(Debug, Clone)]
pub struct ChunkRun {
    db: LocalDb,
    next: u64,
    end: u64,
}

impl ChunkRun {
    /// Reads the next chunk of the run, or `None` once the run is exhausted.
    ///
    /// A missing chunk yields `Err(StoreError::MissingChunk)` and ends the
    /// run.
    pub async fn next_chunk(&mut self) -> Option<Result<Vec<u8>>> {
        if self.next >= self.end {
            return None;
        }
        let id = self.next;
        self.next += 1;

        match self.db.read_chunk(id).await {
            Ok(Some(bytes)) => Some(Ok(bytes)),
            Ok(None) => {
                self.next = self.end;
                Some(Err(StoreError::MissingChunk { id }))
            }
            Err(e) => {
                self.next = self.end;
                Some(Err(e))
            }
        }
    }

    /// Number of chunks not yet read.
    pub fn remaining(&self) -> u64 {
        self.end - self.next
    }
}

fn decode_chunk(record: Record) -> Result<Vec<u8>> {
    record.value.into_blob().ok_or_else(|| {
        StoreError::data(
            DB_DATA_STORE_NAME,
            format!("record {} is not a binary chunk", record.key),
        )
    })
}
