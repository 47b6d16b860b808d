//! Metadata record for one stored file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata stored at `{code}:meta`, keyed by the file's download code.
///
/// The record is written once at upload and mutated exactly once, at
/// download time, to flip `downloaded` — rewritten with the *remaining*
/// TTL so a late retry cannot resurrect it past the original expiry.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Original filename, echoed back in the Content-Disposition header.
    pub file_name: String,

    /// Number of chunk records holding the payload (`{code}:chunk:0..n`).
    pub chunks: u32,

    /// Approximate decoded size in bytes, derived from the encoded length.
    pub total_size: u64,

    /// When the file was uploaded.
    pub created_at: DateTime<Utc>,

    /// Expiry horizon shared by the metadata and every chunk.
    pub expires_at: DateTime<Utc>,

    /// Whether the file has been served already.
    pub downloaded: bool,
}

/// Render a byte count for humans: `0 Bytes`, `1 KB`, `1.5 MB`, ...
///
/// Base 1024, rounded to two decimals with trailing zeros dropped.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let exponent = ((bytes as f64).ln() / 1024_f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024_f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}
