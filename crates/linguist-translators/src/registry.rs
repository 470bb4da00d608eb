use std::sync::Arc;

use tracing::{debug, info, warn};

use linguist_config::{ConfigStore, DEFAULT_TRANSLATOR};
use linguist_store::{Collection, KeyValueBackend, Record, RecordId};

use crate::cache::TranslatorsCache;
use crate::descriptor::{CustomTranslator, TranslatorInfo, TranslatorKind, TranslatorSet};
use crate::error::{TranslatorError, TranslatorResult};
use crate::scheduler::TranslateScheduler;
use crate::TranslatorId;

/// Backend key of the custom translator collection.
pub const TRANSLATORS_COLLECTION: &str = "translators";

/// Engines shipped with the extension.
pub const BUILTIN_TRANSLATORS: &[&str] = &[
    "GoogleTranslator",
    "YandexTranslator",
    "BingTranslatorPublic",
    "ReversoTranslator",
    "TartuNLPTranslator",
];

/// Source of truth for which translators exist.
///
/// Every mutation re-applies the translator set to the scheduler and keeps the
/// configured `translatorModule` pointing at something that exists.
pub struct TranslatorRegistry {
    builtins: Vec<String>,
    customs: Collection<CustomTranslator>,
    config: Arc<ConfigStore>,
    cache: Arc<TranslatorsCache>,
    scheduler: Arc<dyn TranslateScheduler>,
}

impl TranslatorRegistry {
    /// Registry over the custom translator collection of `backend`.
    pub fn new(
        backend: Arc<dyn KeyValueBackend>,
        builtins: Vec<String>,
        config: Arc<ConfigStore>,
        cache: Arc<TranslatorsCache>,
        scheduler: Arc<dyn TranslateScheduler>,
    ) -> Self {
        Self {
            builtins,
            customs: Collection::new(backend, TRANSLATORS_COLLECTION),
            config,
            cache,
            scheduler,
        }
    }

    /// Scheduler the translator set is pushed to.
    pub fn scheduler(&self) -> &Arc<dyn TranslateScheduler> {
        &self.scheduler
    }

    /// Builtin engines plus every stored custom definition.
    pub async fn available_translators(&self) -> TranslatorResult<TranslatorSet> {
        let mut set: TranslatorSet = self
            .builtins
            .iter()
            .map(|name| {
                (
                    TranslatorId::builtin(name.clone()),
                    TranslatorInfo {
                        name: name.clone(),
                        kind: TranslatorKind::Builtin,
                    },
                )
            })
            .collect();
        for Record { id, data } in self.customs.list().await? {
            set.insert(
                TranslatorId::Custom(id),
                TranslatorInfo {
                    name: data.name,
                    kind: TranslatorKind::Custom { code: data.code },
                },
            );
        }
        Ok(set)
    }

    /// Push the current translator set to the scheduler.
    ///
    /// If the configured translator is a custom one that no longer exists the
    /// configuration falls back to [`DEFAULT_TRANSLATOR`]. Idempotent.
    pub async fn apply_translators(&self) -> TranslatorResult<TranslatorSet> {
        let set = self.available_translators().await?;

        let configured = self.config.get_config().await?.translator_module;
        if configured.is_custom() && !set.contains_key(&configured) {
            // Re-checked inside the update so a concurrent change of the
            // option is not overwritten.
            let known = set.clone();
            self.config
                .update(move |mut cfg| {
                    if cfg.translator_module.is_custom() && !known.contains_key(&cfg.translator_module) {
                        cfg.translator_module = TranslatorId::builtin(DEFAULT_TRANSLATOR);
                    }
                    cfg
                })
                .await?;
            warn!(
                missing = %configured,
                fallback = DEFAULT_TRANSLATOR,
                "configured translator no longer exists"
            );
        }

        self.scheduler.set_translators(set.clone());
        debug!(count = set.len(), "translators applied");
        Ok(set)
    }

    /// Store a custom definition and return its record id. The translator is
    /// addressed as [`TranslatorId::Custom`] with that id.
    pub async fn add_translator(&self, definition: CustomTranslator) -> TranslatorResult<RecordId> {
        definition.validate()?;
        let id = self.customs.add(definition).await?;
        self.apply_translators().await?;
        info!(id, "custom translator added");
        Ok(id)
    }

    /// Replace a custom definition. Cached results of the old definition are
    /// dropped.
    pub async fn update_translator(&self, id: RecordId, definition: CustomTranslator) -> TranslatorResult<()> {
        definition.validate()?;
        self.customs.update(id, definition).await.map_err(|e| not_found(e, id))?;
        self.cache.clear(Some(&TranslatorId::Custom(id)));
        self.apply_translators().await?;
        info!(id, "custom translator updated");
        Ok(())
    }

    /// Delete a custom definition, purge its cache scope, then re-apply the
    /// set. The purge happens even if re-applying fails.
    pub async fn delete_translator(&self, id: RecordId) -> TranslatorResult<()> {
        if !self.customs.delete(id).await? {
            return Err(TranslatorError::NotFound(id));
        }
        self.cache.clear(Some(&TranslatorId::Custom(id)));
        self.apply_translators().await?;
        info!(id, "custom translator deleted");
        Ok(())
    }

    /// Stored custom definitions, ordered by id.
    pub async fn get_translators(&self) -> TranslatorResult<Vec<Record<CustomTranslator>>> {
        Ok(self.customs.list().await?)
    }
}

fn not_found(err: linguist_store::StoreError, id: RecordId) -> TranslatorError {
    match err {
        linguist_store::StoreError::RecordNotFound { .. } => TranslatorError::NotFound(id),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{SchedulerError, TranslateRequest};
    use async_trait::async_trait;
    use linguist_config::CONFIG_KEY;
    use linguist_store::InMemoryBackend;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingScheduler {
        applied: Mutex<Vec<TranslatorSet>>,
    }

    impl RecordingScheduler {
        fn last(&self) -> TranslatorSet {
            self.applied.lock().unwrap().last().cloned().unwrap_or_default()
        }

        fn apply_count(&self) -> usize {
            self.applied.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TranslateScheduler for RecordingScheduler {
        async fn translate(
            &self,
            _translator: &TranslatorId,
            request: &TranslateRequest,
        ) -> Result<String, SchedulerError> {
            Ok(request.text.to_uppercase())
        }

        fn set_translators(&self, translators: TranslatorSet) {
            self.applied.lock().unwrap().push(translators);
        }
    }

    struct Fixture {
        registry: TranslatorRegistry,
        config: Arc<ConfigStore>,
        cache: Arc<TranslatorsCache>,
        scheduler: Arc<RecordingScheduler>,
    }

    fn fixture() -> Fixture {
        let backend: Arc<dyn KeyValueBackend> = Arc::new(InMemoryBackend::new());
        let config = Arc::new(ConfigStore::new(backend.clone()));
        let cache = Arc::new(TranslatorsCache::new());
        let scheduler = Arc::new(RecordingScheduler::default());
        let registry = TranslatorRegistry::new(
            backend,
            vec!["GoogleTranslator".into(), "YandexTranslator".into()],
            config.clone(),
            cache.clone(),
            scheduler.clone(),
        );
        Fixture {
            registry,
            config,
            cache,
            scheduler,
        }
    }

    fn mine() -> CustomTranslator {
        CustomTranslator::new("Mine", "class Mine {}")
    }

    #[tokio::test]
    async fn available_lists_builtins_and_customs() {
        let f = fixture();
        let id = TranslatorId::Custom(f.registry.add_translator(mine()).await.unwrap());
        assert_eq!(id, TranslatorId::Custom(1));

        let set = f.registry.available_translators().await.unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set[&id].name, "Mine");
        assert_eq!(set[&TranslatorId::builtin("GoogleTranslator")].kind, TranslatorKind::Builtin);
        assert_eq!(f.scheduler.last(), set);
    }

    #[tokio::test]
    async fn invalid_definition_is_rejected() {
        let f = fixture();
        let err = f
            .registry
            .add_translator(CustomTranslator::new("", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranslatorError::InvalidDefinition(_)));
        assert!(f.registry.get_translators().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn apply_is_idempotent() {
        let f = fixture();
        let first = f.registry.apply_translators().await.unwrap();
        let second = f.registry.apply_translators().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(f.scheduler.apply_count(), 2);
        assert_eq!(
            f.config.get_config().await.unwrap().translator_module,
            TranslatorId::builtin(DEFAULT_TRANSLATOR)
        );
    }

    #[tokio::test]
    async fn deleting_active_translator_falls_back_to_default() {
        let f = fixture();
        let id = TranslatorId::Custom(f.registry.add_translator(mine()).await.unwrap());
        f.config
            .update(|mut cfg| {
                cfg.translator_module = id.clone();
                cfg
            })
            .await
            .unwrap();

        f.registry.delete_translator(1).await.unwrap();

        let cfg = f.config.get_config().await.unwrap();
        assert_eq!(cfg.translator_module, TranslatorId::builtin(DEFAULT_TRANSLATOR));
        assert!(!f.scheduler.last().contains_key(&id));
    }

    #[tokio::test]
    async fn missing_builtin_is_left_alone() {
        let f = fixture();
        f.config
            .update(|mut cfg| {
                cfg.translator_module = TranslatorId::builtin("DeepLTranslator");
                cfg
            })
            .await
            .unwrap();
        f.registry.apply_translators().await.unwrap();
        assert_eq!(
            f.config.get_config().await.unwrap().translator_module,
            TranslatorId::builtin("DeepLTranslator")
        );
    }

    #[tokio::test]
    async fn delete_clears_only_that_scope() {
        let f = fixture();
        let a = TranslatorId::Custom(f.registry.add_translator(mine()).await.unwrap());
        let b = TranslatorId::Custom(f.registry.add_translator(CustomTranslator::new("Other", "x")).await.unwrap());
        let request = TranslateRequest::new("hi", "en", "de");
        f.cache.set(&crate::CacheKey::new(&a, &request, true), "A");
        f.cache.set(&crate::CacheKey::new(&b, &request, true), "B");

        f.registry.delete_translator(1).await.unwrap();

        assert_eq!(f.cache.scope_len(&a), 0);
        assert_eq!(f.cache.scope_len(&b), 1);
    }

    #[tokio::test]
    async fn update_redefines_and_clears_scope() {
        let f = fixture();
        let id = TranslatorId::Custom(f.registry.add_translator(mine()).await.unwrap());
        let request = TranslateRequest::new("hi", "en", "de");
        f.cache.set(&crate::CacheKey::new(&id, &request, true), "stale");

        f.registry
            .update_translator(1, CustomTranslator::new("Mine v2", "class Mine2 {}"))
            .await
            .unwrap();

        assert_eq!(f.cache.scope_len(&id), 0);
        assert_eq!(f.scheduler.last()[&id].name, "Mine v2");
    }

    /// Fails reads of the configuration key once `broken` is set.
    struct ConfigReadFailures {
        inner: InMemoryBackend,
        broken: AtomicBool,
    }

    #[async_trait]
    impl KeyValueBackend for ConfigReadFailures {
        async fn get(&self, key: &str) -> linguist_store::StoreResult<Option<Value>> {
            if key == CONFIG_KEY && self.broken.load(Ordering::SeqCst) {
                return Err(linguist_store::StoreError::Unavailable("config unreadable".into()));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: Value) -> linguist_store::StoreResult<()> {
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> linguist_store::StoreResult<bool> {
            self.inner.remove(key).await
        }

        async fn keys(&self) -> linguist_store::StoreResult<Vec<String>> {
            self.inner.keys().await
        }
    }

    #[tokio::test]
    async fn redefinition_purges_scope_even_if_apply_fails() {
        let backend = Arc::new(ConfigReadFailures {
            inner: InMemoryBackend::new(),
            broken: AtomicBool::new(false),
        });
        let config = Arc::new(ConfigStore::new(backend.clone()));
        let cache = Arc::new(TranslatorsCache::new());
        let registry = TranslatorRegistry::new(
            backend.clone(),
            vec!["GoogleTranslator".into()],
            config,
            cache.clone(),
            Arc::new(RecordingScheduler::default()),
        );
        let first = registry.add_translator(mine()).await.unwrap();
        let second = registry.add_translator(CustomTranslator::new("Other", "x")).await.unwrap();
        let request = TranslateRequest::new("hi", "en", "de");
        for id in [first, second] {
            let key = crate::CacheKey::new(&TranslatorId::Custom(id), &request, true);
            cache.set(&key, "old-definition-result");
        }

        backend.broken.store(true, Ordering::SeqCst);
        assert!(registry
            .update_translator(first, CustomTranslator::new("Mine", "v2"))
            .await
            .is_err());
        assert!(registry.delete_translator(second).await.is_err());

        assert_eq!(registry.get_translators().await.unwrap().len(), 1);
        assert_eq!(registry.get_translators().await.unwrap()[0].data.code, "v2");
        assert_eq!(cache.scope_len(&TranslatorId::Custom(first)), 0);
        assert_eq!(cache.scope_len(&TranslatorId::Custom(second)), 0);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let f = fixture();
        assert!(matches!(
            f.registry.delete_translator(42).await.unwrap_err(),
            TranslatorError::NotFound(42)
        ));
        assert!(matches!(
            f.registry.update_translator(42, mine()).await.unwrap_err(),
            TranslatorError::NotFound(42)
        ));
    }
}
