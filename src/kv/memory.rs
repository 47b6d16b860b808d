//! In-process [`KvStore`] used by tests.
//!
//! TTLs are tracked on the tokio clock, so tests running under
//! `start_paused` can advance time and observe expiry without sleeping
//! for real. Expired entries are dropped lazily on access.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{KvResult, KvStore};

#[derive(Clone, Default)]
pub struct MemoryKv {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    strings: HashMap<String, Entry<String>>,
    sets: HashMap<String, Entry<HashSet<String>>>,
}

struct Entry<T> {
    value: T,
    expires_at: Option<Instant>,
}

impl<T> Entry<T> {
    fn live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }
}

impl Inner {
    fn purge_expired(&mut self, now: Instant) {
        self.strings.retain(|_, entry| entry.live(now));
        self.sets.retain(|_, entry| entry.live(now));
    }
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live string keys, for "no partial writes" assertions.
    pub fn string_key_count(&self) -> usize {
        let mut inner = self.inner.lock().unwrap();
        inner.purge_expired(Instant::now());
        inner.strings.len()
    }

    /// Live members of the set at `key`.
    pub fn set_members(&self, key: &str) -> HashSet<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.purge_expired(Instant::now());
        inner
            .sets
            .get(key)
            .map(|entry| entry.value.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> KvResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.strings.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_seconds)),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let mut inner = self.inner.lock().unwrap();
        inner.purge_expired(Instant::now());
        Ok(inner.strings.get(key).map(|entry| entry.value.clone()))
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        self.inner.lock().unwrap().strings.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> KvResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        inner.purge_expired(Instant::now());
        Ok(inner.strings.contains_key(key))
    }

    async fn sadd(&self, key: &str, member: &str) -> KvResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.purge_expired(Instant::now());
        inner
            .sets
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                value: HashSet::new(),
                expires_at: None,
            })
            .value
            .insert(member.to_string());
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> KvResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.sets.get_mut(key) {
            entry.value.remove(member);
        }
        Ok(())
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> KvResult<()> {
        let deadline = Instant::now() + Duration::from_secs(ttl_seconds);
        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.strings.get_mut(key) {
            entry.expires_at = Some(deadline);
        }
        if let Some(entry) = inner.sets.get_mut(key) {
            entry.expires_at = Some(deadline);
        }
        Ok(())
    }

    async fn ping(&self) -> KvResult<()> {
        Ok(())
    }
}
