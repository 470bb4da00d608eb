use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreResult;

/// Asynchronous persistent key/value backend.
///
/// All implementations must satisfy these invariants:
/// - A successful `set` is visible to every later `get` on the same backend.
/// - Values are opaque JSON documents; the backend never interprets them.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored there.
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> StoreResult<()>;

    /// Remove `key`. Returns `true` if a value existed.
    async fn remove(&self, key: &str) -> StoreResult<bool>;

    /// List all keys currently stored, sorted.
    async fn keys(&self) -> StoreResult<Vec<String>>;

    /// Check whether a value exists under `key`.
    async fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
