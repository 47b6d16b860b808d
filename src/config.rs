use anyhow::{Context, Result};
use clap::Parser;
use std::env;

use crate::services::file_store::StoreSettings;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub redis_url: String,
    /// Base URL advertised in download links, e.g. `https://drop.example.com`.
    pub public_url: String,
    pub ttl_seconds: u64,
    pub max_chunk_bytes: usize,
    pub max_total_bytes: u64,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Ephemeral code-based file drop")]
pub struct Args {
    /// Host to bind to (overrides FILE_DROP_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILE_DROP_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Redis connection URL (overrides FILE_DROP_REDIS_URL)
    #[arg(long)]
    pub redis_url: Option<String>,

    /// Public base URL for download links (overrides FILE_DROP_PUBLIC_URL)
    #[arg(long)]
    pub public_url: Option<String>,

    /// Lifetime of stored files in seconds (overrides FILE_DROP_TTL_SECONDS)
    #[arg(long)]
    pub ttl_seconds: Option<u64>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("FILE_DROP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_env("FILE_DROP_PORT", 3000u16)?;
        let env_redis =
            env::var("FILE_DROP_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let env_public =
            env::var("FILE_DROP_PUBLIC_URL").unwrap_or_else(|_| "http://localhost:3000".into());
        let env_ttl = parse_env("FILE_DROP_TTL_SECONDS", 120u64)?;
        let max_chunk_bytes = parse_env("FILE_DROP_MAX_CHUNK_BYTES", 750 * 1024usize)?;
        let max_total_bytes = parse_env("FILE_DROP_MAX_TOTAL_BYTES", 100 * 1024 * 1024u64)?;

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            redis_url: args.redis_url.unwrap_or(env_redis),
            public_url: args.public_url.unwrap_or(env_public),
            ttl_seconds: args.ttl_seconds.unwrap_or(env_ttl),
            max_chunk_bytes,
            max_total_bytes,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            max_chunk_bytes: self.max_chunk_bytes,
            max_total_bytes: self.max_total_bytes,
            ttl_seconds: self.ttl_seconds,
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}
