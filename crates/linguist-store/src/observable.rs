use std::convert::Infallible;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex as WriteQueue;
use tracing::{trace, warn};

use crate::error::{StoreError, StoreResult};
use crate::path;
use crate::traits::KeyValueBackend;

/// Anything an [`ObservableStore`] can hold.
pub trait StoreValue:
    Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> StoreValue for T where
    T: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

type Notify<T> = Box<dyn FnMut(&T) + Send>;

struct Watcher<T> {
    id: u64,
    notify: Notify<T>,
}

struct HubState<T> {
    current: Arc<T>,
    primed: bool,
    next_id: u64,
    watchers: Vec<Watcher<T>>,
}

/// Fan-out of committed snapshots to watchers, in registration order.
///
/// Delivery happens under the hub lock, so attach/detach and publish are
/// totally ordered: a watcher never misses a commit between its immediate call
/// and its registration, and never sees a commit after it was detached.
/// A panicking watcher is logged and skipped; it cannot poison the hub or stop
/// delivery to the others.
struct WatchHub<T> {
    state: Mutex<HubState<T>>,
}

impl<T> WatchHub<T> {
    fn new(initial: T) -> Self {
        Self {
            state: Mutex::new(HubState {
                current: Arc::new(initial),
                primed: false,
                next_id: 0,
                watchers: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_primed(&self) -> bool {
        self.lock().primed
    }

    fn prime(&self, value: T) {
        let mut state = self.lock();
        if !state.primed {
            state.current = Arc::new(value);
            state.primed = true;
        }
    }

    fn current(&self) -> Arc<T> {
        Arc::clone(&self.lock().current)
    }

    fn publish(&self, value: Arc<T>) {
        let mut state = self.lock();
        state.current = Arc::clone(&value);
        state.primed = true;
        for watcher in state.watchers.iter_mut() {
            deliver(watcher.id, &mut watcher.notify, value.as_ref());
        }
    }

    fn attach(&self, mut notify: Notify<T>) -> u64 {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        deliver(id, &mut notify, state.current.as_ref());
        state.watchers.push(Watcher { id, notify });
        id
    }

    fn watcher_count(&self) -> usize {
        self.lock().watchers.len()
    }
}

fn deliver<T>(id: u64, notify: &mut Notify<T>, value: &T) {
    if panic::catch_unwind(AssertUnwindSafe(|| notify(value))).is_err() {
        warn!(watcher = id, "watcher panicked, delivery skipped");
    }
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64) -> bool;
}

impl<T: Send + Sync> Detach for WatchHub<T> {
    fn detach(&self, id: u64) -> bool {
        let mut state = self.lock();
        let before = state.watchers.len();
        state.watchers.retain(|w| w.id != id);
        state.watchers.len() != before
    }
}

/// Handle returned by [`Observable::watch`].
///
/// Dropping the handle does NOT unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription {
    hub: Weak<dyn Detach>,
    id: u64,
    active: AtomicBool,
}

impl Subscription {
    /// Remove the watcher. Idempotent; once this returns, no further callbacks
    /// are delivered.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            if let Some(hub) = self.hub.upgrade() {
                hub.detach(self.id);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// A derived, change-notified view over an [`ObservableStore`].
///
/// Projections compose with [`Observable::map`] and are evaluated lazily, once
/// per commit per watcher.
pub struct Observable<T, V> {
    hub: Arc<WatchHub<T>>,
    project: Arc<dyn Fn(&T) -> V + Send + Sync>,
}

impl<T, V> Clone for Observable<T, V> {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
            project: Arc::clone(&self.project),
        }
    }
}

impl<T, V> Observable<T, V>
where
    T: Send + Sync + 'static,
    V: Clone + PartialEq + Send + 'static,
{
    /// Derive a new observable through `projection`.
    pub fn map<W, F>(&self, projection: F) -> Observable<T, W>
    where
        F: Fn(&V) -> W + Send + Sync + 'static,
        W: Clone + PartialEq + Send + 'static,
    {
        let inner = Arc::clone(&self.project);
        Observable {
            hub: Arc::clone(&self.hub),
            project: Arc::new(move |snapshot: &T| projection(&inner(snapshot))),
        }
    }

    /// The projected value of the latest committed snapshot.
    pub fn current(&self) -> V {
        let snapshot = self.hub.current();
        (self.project)(snapshot.as_ref())
    }

    /// Invoke `callback` now with the current projected value, then again on
    /// every commit whose projected value differs from the last one delivered.
    ///
    /// Callbacks run synchronously inside the commit and must not subscribe or
    /// unsubscribe on this store from within the callback; hand work that
    /// touches the store off to a task instead.
    pub fn watch<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(&V) + Send + 'static,
    {
        let project = Arc::clone(&self.project);
        let mut last: Option<V> = None;
        let id = self.hub.attach(Box::new(move |snapshot: &T| {
            let next = project(snapshot);
            if last.as_ref() != Some(&next) {
                callback(&next);
                last = Some(next);
            }
        }));
        let hub: Weak<WatchHub<T>> = Arc::downgrade(&self.hub);
        let hub: Weak<dyn Detach> = hub;
        Subscription {
            hub,
            id,
            active: AtomicBool::new(true),
        }
    }
}

/// Reactive typed store over one key of a [`KeyValueBackend`].
///
/// Reads fall back to `default` when nothing is persisted. All writes go
/// through a FIFO queue, so concurrent `update` calls never lose each other's
/// changes. One instance should own a key; watchers only see commits made
/// through the instance they subscribed on.
pub struct ObservableStore<T> {
    backend: Arc<dyn KeyValueBackend>,
    key: String,
    default: T,
    writes: WriteQueue<()>,
    hub: Arc<WatchHub<T>>,
}

impl<T: StoreValue> ObservableStore<T> {
    /// Store over `key`, reading as `default` until something is written.
    pub fn new(backend: Arc<dyn KeyValueBackend>, key: impl Into<String>, default: T) -> Self {
        Self {
            backend,
            key: key.into(),
            hub: Arc::new(WatchHub::new(default.clone())),
            default,
            writes: WriteQueue::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value reported when nothing is persisted.
    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Read the persisted value, or the default if none is stored.
    pub async fn get(&self) -> StoreResult<T> {
        match self.backend.get(&self.key).await? {
            Some(raw) => {
                serde_json::from_value(raw).map_err(|e| StoreError::serialization(&self.key, e))
            }
            None => Ok(self.default.clone()),
        }
    }

    /// Read one dotted path of the value.
    pub async fn get_at(&self, path: &str) -> StoreResult<Value> {
        let value = self.get().await?;
        let doc = serde_json::to_value(&value).map_err(|e| StoreError::serialization(&self.key, e))?;
        path::get_path(&doc, path)
            .cloned()
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))
    }

    /// Replace the whole value.
    pub async fn set(&self, value: T) -> StoreResult<()> {
        let _queued = self.writes.lock().await;
        self.commit(value).await
    }

    /// Replace the value at one existing dotted path.
    pub async fn set_at(&self, path: &str, value: Value) -> StoreResult<()> {
        let key = self.key.clone();
        let path = path.to_string();
        self.try_update(move |current| {
            let mut doc =
                serde_json::to_value(&current).map_err(|e| StoreError::serialization(&key, e))?;
            if !path::set_path(&mut doc, &path, value) {
                return Err(StoreError::InvalidPath(path));
            }
            serde_json::from_value(doc).map_err(|e| StoreError::serialization(&key, e))
        })
        .await?
        .map(|_| ())
    }

    /// Read-modify-write. Returns the committed value.
    pub async fn update<F>(&self, updater: F) -> StoreResult<T>
    where
        F: FnOnce(T) -> T + Send,
    {
        match self.try_update(|current| Ok::<T, Infallible>(updater(current))).await? {
            Ok(value) => Ok(value),
            Err(never) => match never {},
        }
    }

    /// Read-modify-write that may refuse. When `updater` returns `Err`,
    /// nothing is committed and the error is handed back in the inner result.
    pub async fn try_update<F, E>(&self, updater: F) -> StoreResult<Result<T, E>>
    where
        F: FnOnce(T) -> Result<T, E> + Send,
        E: Send,
    {
        let _queued = self.writes.lock().await;
        let current = self.get().await?;
        match updater(current) {
            Ok(next) => {
                self.commit(next.clone()).await?;
                Ok(Ok(next))
            }
            Err(e) => Ok(Err(e)),
        }
    }

    /// Observable handle on this store's committed snapshots.
    pub async fn get_observable(&self) -> StoreResult<Observable<T, T>> {
        if !self.hub.is_primed() {
            let _queued = self.writes.lock().await;
            if !self.hub.is_primed() {
                let value = self.get().await?;
                self.hub.prime(value);
            }
        }
        Ok(Observable {
            hub: Arc::clone(&self.hub),
            project: Arc::new(|snapshot: &T| snapshot.clone()),
        })
    }

    /// Number of live watchers across every observable derived from this store.
    pub fn watcher_count(&self) -> usize {
        self.hub.watcher_count()
    }

    // Must be called with the write queue held.
    async fn commit(&self, value: T) -> StoreResult<()> {
        let raw = serde_json::to_value(&value).map_err(|e| StoreError::serialization(&self.key, e))?;
        self.backend.set(&self.key, raw).await?;
        trace!(key = %self.key, "snapshot committed");
        self.hub.publish(Arc::new(value));
        Ok(())
    }
}

impl<T> std::fmt::Debug for ObservableStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableStore")
            .field("key", &self.key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use proptest::prelude::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Settings {
        use_cache: bool,
        language: String,
    }

    fn settings_store() -> (Arc<InMemoryBackend>, ObservableStore<Settings>) {
        let backend = Arc::new(InMemoryBackend::new());
        let store = ObservableStore::new(
            backend.clone(),
            "settings",
            Settings {
                use_cache: true,
                language: "en".into(),
            },
        );
        (backend, store)
    }

    fn recorder<V: Clone + Send + 'static>() -> (Arc<StdMutex<Vec<V>>>, impl FnMut(&V) + Send + 'static) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |v: &V| sink.lock().unwrap().push(v.clone()))
    }

    #[tokio::test]
    async fn get_falls_back_to_default() {
        let (_, store) = settings_store();
        let value = store.get().await.unwrap();
        assert!(value.use_cache);
        assert_eq!(value.language, "en");
    }

    #[tokio::test]
    async fn set_then_get() {
        let (backend, store) = settings_store();
        let next = Settings {
            use_cache: false,
            language: "de".into(),
        };
        store.set(next.clone()).await.unwrap();
        assert_eq!(store.get().await.unwrap(), next);
        assert_eq!(
            backend.get("settings").await.unwrap(),
            Some(json!({ "use_cache": false, "language": "de" }))
        );
    }

    #[tokio::test]
    async fn panicking_watcher_does_not_break_commits() {
        let backend = Arc::new(InMemoryBackend::new());
        let store = ObservableStore::new(backend.clone(), "n", 0i64);
        let observable = store.get_observable().await.unwrap();
        let _bad = observable.watch(|v: &i64| {
            if *v == 1 {
                panic!("watcher failure");
            }
        });
        let (seen, callback) = recorder::<i64>();
        let _good = observable.watch(callback);

        store.set(1).await.unwrap();
        store.set(2).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(observable.current(), 2);
        assert_eq!(backend.get("n").await.unwrap(), Some(json!(2)));
        assert_eq!(store.watcher_count(), 2);
    }

    #[tokio::test]
    async fn path_access() {
        let (_, store) = settings_store();
        assert_eq!(store.get_at("language").await.unwrap(), json!("en"));
        store.set_at("language", json!("fr")).await.unwrap();
        assert_eq!(store.get().await.unwrap().language, "fr");

        let err = store.set_at("missing", json!(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath(_)));
        let err = store.set_at("use_cache", json!("yes")).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization { .. }));
        assert!(store.get().await.unwrap().use_cache);
    }

    #[tokio::test]
    async fn watch_fires_immediately_then_on_change() {
        let (_, store) = settings_store();
        let observable = store.get_observable().await.unwrap();
        let (seen, callback) = recorder::<bool>();
        let _sub = observable.map(|s| s.use_cache).watch(callback);
        assert_eq!(*seen.lock().unwrap(), vec![true]);

        // Projection unchanged: no callback.
        store
            .update(|mut s| {
                s.language = "de".into();
                s
            })
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![true]);

        store
            .update(|mut s| {
                s.use_cache = false;
                s
            })
            .await
            .unwrap();
        store
            .update(|mut s| {
                s.use_cache = false;
                s
            })
            .await
            .unwrap();
        store
            .update(|mut s| {
                s.use_cache = true;
                s
            })
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![true, false, true]);
    }

    #[tokio::test]
    async fn watch_sees_persisted_value_first() {
        let backend = Arc::new(InMemoryBackend::with_entries([(
            "settings",
            json!({ "use_cache": false, "language": "ja" }),
        )]));
        let store = ObservableStore::new(backend, "settings", Settings::default());
        let observable = store.get_observable().await.unwrap();
        assert_eq!(observable.current().language, "ja");
    }

    #[tokio::test]
    async fn watchers_fire_in_registration_order() {
        let (_, store) = settings_store();
        let observable = store.get_observable().await.unwrap();
        let order = Arc::new(StdMutex::new(Vec::new()));
        let subs: Vec<Subscription> = (0..3)
            .map(|i| {
                let order = order.clone();
                observable
                    .map(|s| s.language.clone())
                    .watch(move |_| order.lock().unwrap().push(i))
            })
            .collect();
        order.lock().unwrap().clear();
        store
            .update(|mut s| {
                s.language = "it".into();
                s
            })
            .await
            .unwrap();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(subs.len(), 3);
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent_and_immediate() {
        let (_, store) = settings_store();
        let observable = store.get_observable().await.unwrap();
        let (seen, callback) = recorder::<String>();
        let sub = observable.map(|s| s.language.clone()).watch(callback);
        assert_eq!(store.watcher_count(), 1);

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(store.watcher_count(), 0);

        store
            .update(|mut s| {
                s.language = "pl".into();
                s
            })
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["en".to_string()]);
    }

    #[tokio::test]
    async fn failed_write_is_not_published() {
        let (backend, store) = settings_store();
        let observable = store.get_observable().await.unwrap();
        let (seen, callback) = recorder::<bool>();
        let _sub = observable.map(|s| s.use_cache).watch(callback);

        backend.set_fail_writes(true);
        let err = store
            .update(|mut s| {
                s.use_cache = false;
                s
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(*seen.lock().unwrap(), vec![true]);
        assert!(observable.current().use_cache);

        backend.set_fail_writes(false);
        assert!(store.get().await.unwrap().use_cache);
    }

    #[tokio::test]
    async fn refused_update_commits_nothing() {
        let (_, store) = settings_store();
        let result = store
            .try_update(|_| Err::<Settings, &str>("rejected"))
            .await
            .unwrap();
        assert_eq!(result.unwrap_err(), "rejected");
        assert_eq!(store.get().await.unwrap().language, "en");
    }

    #[tokio::test]
    async fn read_failure_propagates() {
        let (backend, store) = settings_store();
        backend.set_fail_reads(true);
        assert!(store.get().await.is_err());
        assert!(store.update(|s| s).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_are_not_lost() {
        let backend = Arc::new(InMemoryBackend::new());
        let store = Arc::new(ObservableStore::new(backend, "counter", 0i64));
        let tasks: Vec<_> = (1..=64)
            .map(|k| {
                let store = store.clone();
                tokio::spawn(async move { store.update(move |v| v + k).await.unwrap() })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(store.get().await.unwrap(), (1..=64).sum::<i64>());
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .build()
            .unwrap()
    }

    proptest! {
        #[test]
        fn watcher_fires_once_per_distinct_projection(values in proptest::collection::vec(0i64..12, 0..24)) {
            let delivered = runtime().block_on(async {
                let store = ObservableStore::new(Arc::new(InMemoryBackend::new()), "n", 0i64);
                let observable = store.get_observable().await.unwrap();
                let (seen, callback) = recorder::<i64>();
                let _sub = observable.map(|v| v % 3).watch(callback);
                for v in &values {
                    store.set(*v).await.unwrap();
                }
                let out = seen.lock().unwrap().clone();
                out
            });

            let mut expected = vec![0i64];
            for v in &values {
                let projected = v % 3;
                if expected.last() != Some(&projected) {
                    expected.push(projected);
                }
            }
            prop_assert_eq!(delivered, expected);
        }

        #[test]
        fn concurrent_appends_fold_to_a_permutation(ids in proptest::collection::btree_set(0u32..1000, 1..32)) {
            let ids: Vec<u32> = ids.into_iter().collect();
            let folded = runtime().block_on(async {
                let store = Arc::new(ObservableStore::new(
                    Arc::new(InMemoryBackend::new()),
                    "log",
                    Vec::<u32>::new(),
                ));
                let tasks: Vec<_> = ids
                    .iter()
                    .copied()
                    .map(|id| {
                        let store = store.clone();
                        tokio::spawn(async move {
                            store
                                .update(move |mut log| {
                                    log.push(id);
                                    log
                                })
                                .await
                                .unwrap();
                        })
                    })
                    .collect();
                for task in tasks {
                    task.await.unwrap();
                }
                store.get().await.unwrap()
            });

            let mut sorted = folded.clone();
            sorted.sort_unstable();
            prop_assert_eq!(sorted, ids);
        }
    }
}
