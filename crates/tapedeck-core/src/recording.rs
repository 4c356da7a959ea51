//! Streaming recorded samples into and out of the data store.
//!
//! A recording is a run of consecutive chunks of 16-bit little-endian PCM
//! samples, `chunk_length` samples per chunk except for a shorter last one.
//! [`RecordingWriter`] produces such a run and describes it with a
//! [`RecordingInfo`], which a leaf tree node then carries.

use std::io::Write;

use log::debug;

use crate::{
    error::{Result, StoreError},
    models::{bytes_to_samples, samples_to_bytes, RecordingInfo, BYTES_PER_SAMPLE, DB_CHUNK_LENGTH, DB_NO_KEY},
    schema::DB_DATA_STORE_NAME,
    LocalDb,
};

/// Buffers pushed samples and appends a chunk each time the buffer fills.
#[derive(Debug)]
pub struct RecordingWriter {
    db: LocalDb,
    sample_rate: u32,
    chunk_length: u32,
    buffer: Vec<i16>,
    start_key: Option<u64>,
    chunks_written: u64,
    n_samples: u64,
}

impl RecordingWriter {
    /// Starts a recording at `sample_rate` samples per second.
    pub fn new(db: &LocalDb, sample_rate: u32) -> Self {
        Self {
            db: db.clone(),
            sample_rate,
            chunk_length: DB_CHUNK_LENGTH,
            buffer: Vec::with_capacity(DB_CHUNK_LENGTH as usize),
            start_key: None,
            chunks_written: 0,
            n_samples: 0,
        }
    }

    /// Sets the number of samples per chunk. Must be set before the first
    /// push; zero is treated as one.
    pub fn with_chunk_length(mut self, chunk_length: u32) -> Self {
        self.chunk_length = chunk_length.max(1);
        self.buffer = Vec::with_capacity(self.chunk_length as usize);
        self
    }

    /// Samples accepted so far, including those still buffered.
    pub fn samples_pushed(&self) -> u64 {
        self.n_samples + self.buffer.len() as u64
    }

    /// Accepts samples, appending a chunk for every buffer that fills.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Data` if another writer appended a chunk in the
    /// middle of this recording's run.
    pub async fn push(&mut self, samples: &[i16]) -> Result<()> {
        let chunk_length = self.chunk_length as usize;
        let mut rest = samples;
        while !rest.is_empty() {
            let take = (chunk_length - self.buffer.len()).min(rest.len());
            self.buffer.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.buffer.len() == chunk_length {
                self.flush().await?;
            }
        }
        Ok(())
    }

    /// Appends the partly filled last chunk and describes the recording.
    ///
    /// A recording with no samples has no chunks and starts at
    /// [`DB_NO_KEY`].
    pub async fn finish(mut self) -> Result<RecordingInfo> {
        if !self.buffer.is_empty() {
            self.flush().await?;
        }
        let info = RecordingInfo {
            db_start_key: self.start_key.unwrap_or(DB_NO_KEY),
            n_samples: self.n_samples,
            sample_rate: self.sample_rate,
            chunk_length: self.chunk_length,
        };
        debug!(
            "Finished recording: {} sample(s) in {} chunk(s) from key {}",
            info.n_samples, self.chunks_written, info.db_start_key
        );
        Ok(info)
    }

    async fn flush(&mut self) -> Result<()> {
        let key = self.db.append_chunk(samples_to_bytes(&self.buffer)).await?;
        let start = *self.start_key.get_or_insert(key);
        if key != start + self.chunks_written {
            return Err(StoreError::data(
                DB_DATA_STORE_NAME,
                format!(
                    "chunk {key} breaks the run starting at {start} after {} chunk(s)",
                    self.chunks_written
                ),
            ));
        }
        self.chunks_written += 1;
        self.n_samples += self.buffer.len() as u64;
        self.buffer.clear();
        Ok(())
    }
}

impl LocalDb {
    /// Reads a recording's samples back, trimmed to its sample count.
    pub async fn recording_samples(&self, info: &RecordingInfo) -> Result<Vec<i16>> {
        let mut samples = Vec::new();
        let mut run = self.chunk_run(info.db_start_key, info.chunk_count());
        while let Some(chunk) = run.next_chunk().await {
            samples.extend(bytes_to_samples(&chunk?));
        }
        samples.truncate(usize::try_from(info.n_samples).unwrap_or(usize::MAX));
        Ok(samples)
    }

    /// Writes a recording's raw PCM bytes to `writer`, one chunk at a time;
    /// returns the number of bytes written.
    pub async fn export_raw<W: Write + ?Sized>(
        &self,
        info: &RecordingInfo,
        writer: &mut W,
    ) -> Result<u64> {
        let mut remaining = info.n_samples.saturating_mul(BYTES_PER_SAMPLE as u64);
        let mut written = 0;
        let mut run = self.chunk_run(info.db_start_key, info.chunk_count());
        while let Some(chunk) = run.next_chunk().await {
            let chunk = chunk?;
            let len = usize::try_from(remaining).map_or(chunk.len(), |r| r.min(chunk.len()));
            writer.write_all(&chunk[..len])?;
            remaining -= len as u64;
            written += len as u64;
        }
        writer.flush()?;
        Ok(written)
    }
}
