use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::scheduler::{SchedulerError, TranslateRequest};
use crate::TranslatorId;

type Digest = [u8; 32];

/// Identity of one memoized translation, scoped to the translator that
/// produced it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    scope: TranslatorId,
    digest: Digest,
}

impl CacheKey {
    /// Hash the request parameters. With `ignore_case`, texts differing only
    /// in case share an entry.
    pub fn new(translator: &TranslatorId, request: &TranslateRequest, ignore_case: bool) -> Self {
        let text = if ignore_case {
            request.text.to_lowercase()
        } else {
            request.text.clone()
        };
        // Field order of `TranslateOptions` is fixed, so this is canonical.
        let options = serde_json::to_string(&request.options).unwrap_or_default();

        let mut hasher = blake3::Hasher::new();
        for field in [
            translator.to_string().as_str(),
            text.as_str(),
            request.from.as_str(),
            request.to.as_str(),
            options.as_str(),
        ] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        Self {
            scope: translator.clone(),
            digest: *hasher.finalize().as_bytes(),
        }
    }

    /// Translator whose scope holds this key.
    pub fn scope(&self) -> &TranslatorId {
        &self.scope
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, hex::encode(&self.digest[..8]))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub value: String,
    pub created_at: DateTime<Utc>,
}

/// Clear counters. An insert is accepted only if no clear touched its scope
/// since the computation started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Epoch {
    global: u64,
    scope: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<TranslatorId, HashMap<Digest, CacheEntry>>,
    scope_epochs: HashMap<TranslatorId, u64>,
    global_epoch: u64,
}

impl CacheState {
    fn epoch(&self, scope: &TranslatorId) -> Epoch {
        Epoch {
            global: self.global_epoch,
            scope: self.scope_epochs.get(scope).copied().unwrap_or(0),
        }
    }
}

type Flight = Arc<OnceCell<Result<String, SchedulerError>>>;

/// Per-translator translation cache with in-flight deduplication.
///
/// Concurrent lookups of the same key share one computation, so a translator
/// is invoked at most once per key at a time.
pub struct TranslatorsCache {
    state: Mutex<CacheState>,
    inflight: Mutex<HashMap<CacheKey, Flight>>,
}

impl TranslatorsCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Cached entry for `key`.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let state = self.state.lock().expect("cache lock poisoned");
        state.entries.get(&key.scope)?.get(&key.digest).cloned()
    }

    /// Store a translation under `key`.
    pub fn set(&self, key: &CacheKey, value: impl Into<String>) {
        let mut state = self.state.lock().expect("cache lock poisoned");
        Self::insert(&mut state, key, value.into());
    }

    /// Purge one translator's entries, or everything when `scope` is `None`.
    /// Returns the number of entries removed.
    pub fn clear(&self, scope: Option<&TranslatorId>) -> usize {
        let mut state = self.state.lock().expect("cache lock poisoned");
        let removed = match scope {
            Some(scope) => {
                *state.scope_epochs.entry(scope.clone()).or_insert(0) += 1;
                state.entries.remove(scope).map(|m| m.len()).unwrap_or(0)
            }
            None => {
                state.global_epoch += 1;
                let removed = state.entries.values().map(HashMap::len).sum();
                state.entries.clear();
                removed
            }
        };
        debug!(scope = ?scope.map(ToString::to_string), removed, "cache cleared");
        removed
    }

    /// Total number of entries across all scopes.
    pub fn len(&self) -> usize {
        let state = self.state.lock().expect("cache lock poisoned");
        state.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries scoped to `scope`.
    pub fn scope_len(&self, scope: &TranslatorId) -> usize {
        let state = self.state.lock().expect("cache lock poisoned");
        state.entries.get(scope).map(HashMap::len).unwrap_or(0)
    }

    /// Return the cached value for `key`, or run `translate` to produce it.
    ///
    /// If a computation for `key` is already running, wait for its result
    /// instead of starting another. Failures are shared with the waiters but
    /// never cached. A result whose scope was cleared while it was being
    /// computed is returned to callers but not stored.
    pub async fn get_or_translate<F, Fut>(
        &self,
        key: CacheKey,
        translate: F,
    ) -> Result<String, SchedulerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, SchedulerError>>,
    {
        if let Some(hit) = self.get(&key) {
            return Ok(hit.value);
        }

        let flight: Flight = {
            let mut inflight = self.inflight.lock().expect("inflight lock poisoned");
            Arc::clone(inflight.entry(key.clone()).or_default())
        };

        let outcome = flight
            .get_or_init(|| async {
                // A previous flight may have landed between our miss and joining.
                if let Some(hit) = self.get(&key) {
                    return Ok(hit.value);
                }
                let started = self.epoch_of(key.scope());
                let result = translate().await;
                if let Ok(value) = &result {
                    self.insert_if_unchanged(&key, value, started);
                }
                result
            })
            .await
            .clone();

        {
            let mut inflight = self.inflight.lock().expect("inflight lock poisoned");
            if inflight.get(&key).is_some_and(|current| Arc::ptr_eq(current, &flight)) {
                inflight.remove(&key);
            }
        }
        outcome
    }

    fn epoch_of(&self, scope: &TranslatorId) -> Epoch {
        self.state.lock().expect("cache lock poisoned").epoch(scope)
    }

    fn insert_if_unchanged(&self, key: &CacheKey, value: &str, started: Epoch) {
        let mut state = self.state.lock().expect("cache lock poisoned");
        if state.epoch(&key.scope) == started {
            Self::insert(&mut state, key, value.to_string());
        } else {
            debug!(%key, "dropping result computed across a cache clear");
        }
    }

    fn insert(state: &mut CacheState, key: &CacheKey, value: String) {
        state.entries.entry(key.scope.clone()).or_default().insert(
            key.digest,
            CacheEntry {
                value,
                created_at: Utc::now(),
            },
        );
    }
}

impl Default for TranslatorsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TranslatorsCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatorsCache")
            .field("entries", &self.len())
            .finish()
    }
}
