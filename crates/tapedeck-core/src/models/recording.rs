//! Recording metadata linking a tree node to its run of data chunks.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Number of samples held by one data chunk.
pub const DB_CHUNK_LENGTH: u32 = 32768;

/// Bytes per stored sample (16-bit PCM).
pub const BYTES_PER_SAMPLE: usize = 2;

fn default_chunk_length() -> u32 {
    DB_CHUNK_LENGTH
}

/// Where a finished recording's samples live in the data store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordingInfo {
    /// Key of the first chunk of the run
    pub db_start_key: u64,

    /// Total number of samples recorded
    pub n_samples: u64,

    /// Samples per second
    pub sample_rate: u32,

    /// Samples per chunk when the recording was written
    #[serde(default = "default_chunk_length")]
    pub chunk_length: u32,
}

impl RecordingInfo {
    /// Number of chunks in the run: `ceil(n_samples / chunk_length)`.
    pub fn chunk_count(&self) -> u64 {
        chunk_count(self.n_samples, self.chunk_length)
    }

    /// Keys of the chunks in the run.
    pub fn chunk_keys(&self) -> Range<u64> {
        self.db_start_key..self.db_start_key.saturating_add(self.chunk_count())
    }

    /// Length of the recording in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.n_samples as f64 / f64::from(self.sample_rate)
    }
}

/// Chunks needed to hold `n_samples` samples at `chunk_length` per chunk.
pub fn chunk_count(n_samples: u64, chunk_length: u32) -> u64 {
    let chunk_length = u64::from(chunk_length.max(1));
    n_samples / chunk_length + u64::from(n_samples % chunk_length != 0)
}

/// Encodes samples as little-endian 16-bit PCM.
pub fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|sample| sample.to_le_bytes()).collect()
}

/// Decodes little-endian 16-bit PCM; a trailing odd byte is ignored.
pub fn bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
