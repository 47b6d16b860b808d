//! src/services/file_store.rs
//!
//! FileStore — the ephemeral blob store behind the upload/download
//! endpoints. Payloads are chunked through the codec and written to a
//! TTL-bearing key-value backend; a scheduled sweep removes whatever the
//! per-key TTLs have not already reclaimed.
//!
//! Key layout per code `H`:
//!
//! ```text
//! H:meta       → FileRecord JSON       (TTL)
//! H:chunk:{i}  → payload fragment i    (TTL)
//! active_files → set of live codes     (TTL, refreshed on upload)
//! ```

use std::sync::Arc;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::codec::{self, CodecError};
use crate::kv::{KvError, KvResult, KvStore};
use crate::models::file::{FileRecord, human_size};

/// Redis set tracking codes that have not been cleaned up yet. Advisory
/// bookkeeping only; the per-key TTLs are authoritative for expiry.
const ACTIVE_SET_KEY: &str = "active_files";

/// Attempts at drawing an unused code before giving up.
const MAX_CODE_ATTEMPTS: u32 = 5;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File too large. Maximum size is {0}")]
    TooLarge(String),
    #[error("File too large after processing. Maximum size is {0}")]
    TooLargeEncoded(String),
    #[error("payload is not valid base64: {0}")]
    InvalidPayload(#[from] base64::DecodeError),
    #[error("file not found or link expired")]
    NotFound,
    #[error("no unused download code after {0} attempts")]
    CodeAllocation(u32),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("corrupt metadata record: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error(transparent)]
    Kv(#[from] KvError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Tunable limits and lifetime for stored files.
#[derive(Clone, Debug)]
pub struct StoreSettings {
    /// Per-chunk ceiling in encoded bytes. Sized to stay safely under the
    /// backend's per-value payload limit (750 KiB against Redis 1 MiB).
    pub max_chunk_bytes: usize,

    /// Total ceiling in decoded bytes.
    pub max_total_bytes: u64,

    /// Lifetime of every key written for one file.
    pub ttl_seconds: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            max_chunk_bytes: 750 * 1024,
            max_total_bytes: 100 * 1024 * 1024,
            ttl_seconds: 120,
        }
    }
}

/// FileStore provides the code-based transfer operations:
/// - Put a payload (validates size, chunks it, writes metadata + chunks
///   with a shared TTL, registers the code, schedules the sweep)
/// - Get a payload by code (reassembles chunks, marks the record
///   downloaded, deletes the chunks best-effort)
///
/// Writes across keys are not transactional; see the notes on `get` for
/// how partially-written files are surfaced.
#[derive(Clone)]
pub struct FileStore {
    kv: Arc<dyn KvStore>,
    settings: StoreSettings,
}

fn meta_key(code: &str) -> String {
    format!("{}:meta", code)
}

fn chunk_key(code: &str, index: u32) -> String {
    format!("{}:chunk:{}", code, index)
}

/// Draw a 6-character uppercase hex code from 3 random bytes.
fn generate_code() -> String {
    let bytes: [u8; 3] = rand::rng().random();
    format!("{:02X}{:02X}{:02X}", bytes[0], bytes[1], bytes[2])
}

/// Strip a `data:...;base64,` prefix if present. The base64 alphabet
/// contains no comma, so splitting on the first one is unambiguous.
fn base64_body(payload: &str) -> &str {
    payload
        .split_once(',')
        .map(|(_, body)| body)
        .unwrap_or(payload)
}

impl FileStore {
    pub fn new(kv: Arc<dyn KvStore>, settings: StoreSettings) -> Self {
        Self { kv, settings }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.settings.ttl_seconds
    }

    /// Liveness of the backing key-value store, for readiness probes.
    pub async fn backend_healthy(&self) -> KvResult<()> {
        self.kv.ping().await
    }

    /// Store an encoded payload and hand back its download code.
    ///
    /// Both size checks reject before any key is written, so a refused
    /// upload leaves nothing behind. Metadata is written before chunks so
    /// a concurrent reader never sees chunks without metadata.
    pub async fn put(&self, file_name: &str, payload: &str) -> StoreResult<(String, FileRecord)> {
        // Coarse pre-check on the decoded length, with slack; the precise
        // check below runs on the chunked encoded length.
        let decoded_len = general_purpose::STANDARD.decode(base64_body(payload))?.len();
        if decoded_len as u64 > self.settings.max_total_bytes * 2 {
            return Err(StoreError::TooLarge(human_size(
                self.settings.max_total_bytes,
            )));
        }

        let fragments = codec::split(payload, self.settings.max_chunk_bytes);
        let encoded_len: u64 = fragments.iter().map(|f| f.len() as u64).sum();
        // Encoded length × 3/4 approximates the decoded size.
        if encoded_len * 3 > self.settings.max_total_bytes * 4 {
            return Err(StoreError::TooLargeEncoded(human_size(
                self.settings.max_total_bytes,
            )));
        }

        let code = self.allocate_code().await?;

        let ttl = self.settings.ttl_seconds;
        let now = Utc::now();
        let record = FileRecord {
            file_name: file_name.to_string(),
            chunks: fragments.len() as u32,
            total_size: encoded_len * 3 / 4,
            created_at: now,
            expires_at: now + chrono::Duration::seconds(ttl as i64),
            downloaded: false,
        };

        self.kv.sadd(ACTIVE_SET_KEY, &code).await?;
        self.kv.expire(ACTIVE_SET_KEY, ttl).await?;
        self.kv
            .set_ex(&meta_key(&code), &serde_json::to_string(&record)?, ttl)
            .await?;
        for (index, fragment) in fragments.iter().enumerate() {
            self.kv
                .set_ex(&chunk_key(&code, index as u32), fragment, ttl)
                .await?;
        }

        debug!(
            "stored `{}` as {} ({} chunks, ~{})",
            file_name,
            code,
            record.chunks,
            human_size(record.total_size)
        );

        self.schedule_sweep(code.clone(), record.chunks);
        Ok((code, record))
    }

    /// Fetch a stored payload by code and consume it.
    ///
    /// An absent metadata record reads as NotFound whether the code never
    /// existed, expired, or was already consumed; those cases are
    /// indistinguishable on purpose. A missing chunk aborts the read —
    /// this also covers racing an in-progress upload, which a retry will
    /// see completed. Post-read housekeeping is best-effort: the payload
    /// is returned even if it fails.
    pub async fn get(&self, code: &str) -> StoreResult<(FileRecord, Vec<u8>)> {
        let raw = self
            .kv
            .get(&meta_key(code))
            .await?
            .ok_or(StoreError::NotFound)?;
        let mut record: FileRecord = serde_json::from_str(&raw)?;

        let mut fragments = Vec::with_capacity(record.chunks as usize);
        for index in 0..record.chunks {
            fragments.push(self.kv.get(&chunk_key(code, index)).await?);
        }
        let payload = codec::join(fragments)?;

        record.downloaded = true;
        if let Err(err) = self.finish_download(code, &record).await {
            warn!("post-download cleanup for {} failed: {}", code, err);
        }

        let bytes = general_purpose::STANDARD.decode(base64_body(&payload))?;
        Ok((record, bytes))
    }

    /// Mark the record downloaded and drop everything else for the code.
    ///
    /// The metadata is rewritten with its *remaining* TTL, never a fresh
    /// one, so a consumed record cannot outlive the original horizon. A
    /// record already past expiry is left to the backend.
    async fn finish_download(&self, code: &str, record: &FileRecord) -> StoreResult<()> {
        let remaining = (record.expires_at - Utc::now()).num_seconds();
        if remaining > 0 {
            self.kv
                .set_ex(
                    &meta_key(code),
                    &serde_json::to_string(record)?,
                    remaining as u64,
                )
                .await?;
        }
        self.delete_chunks(code, record.chunks).await?;
        self.kv.srem(ACTIVE_SET_KEY, code).await?;
        Ok(())
    }

    async fn delete_chunks(&self, code: &str, chunk_count: u32) -> StoreResult<()> {
        for index in 0..chunk_count {
            self.kv.del(&chunk_key(code, index)).await?;
        }
        Ok(())
    }

    /// Draw codes until one is unused. The retry closes the (small)
    /// collision window against the active code space.
    async fn allocate_code(&self) -> StoreResult<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code();
            if !self.kv.exists(&meta_key(&code)).await? {
                return Ok(code);
            }
            debug!("code {} already in use, drawing another", code);
        }
        Err(StoreError::CodeAllocation(MAX_CODE_ATTEMPTS))
    }

    /// Spawn the deferred cleanup for a fresh upload.
    ///
    /// Runs at the TTL horizon and removes every key for the code if it
    /// was never downloaded. Redundant with the backend's own per-key
    /// expiry, but removes the whole set of keys together and keeps the
    /// active set accurate sooner. Failures are logged, never surfaced.
    fn schedule_sweep(&self, code: String, chunk_count: u32) {
        let kv = Arc::clone(&self.kv);
        let ttl = self.settings.ttl_seconds;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(ttl)).await;
            if let Err(err) = sweep(kv.as_ref(), &code, chunk_count).await {
                warn!("scheduled cleanup for {} failed: {}", code, err);
            }
        });
    }
}

/// Delete all keys for `code` unless the file was downloaded (its own
/// cleanup already ran then). Tolerates keys the backend expired first:
/// deleting an absent key is a no-op.
async fn sweep(kv: &dyn KvStore, code: &str, chunk_count: u32) -> StoreResult<()> {
    let Some(raw) = kv.get(&meta_key(code)).await? else {
        return Ok(());
    };
    let record: FileRecord = serde_json::from_str(&raw)?;
    if record.downloaded {
        return Ok(());
    }

    debug!("sweeping expired file {}", code);
    kv.del(&meta_key(code)).await?;
    for index in 0..chunk_count {
        kv.del(&chunk_key(code, index)).await?;
    }
    kv.srem(ACTIVE_SET_KEY, code).await?;
    Ok(())
}
