use std::sync::Arc;

use tracing::debug;

use linguist_config::ConfigStore;

use crate::cache::{CacheKey, TranslatorsCache};
use crate::error::TranslatorResult;
use crate::scheduler::{TranslateRequest, TranslateScheduler};

/// Translates with the configured engine, through the cache when enabled.
pub struct TranslationService {
    config: Arc<ConfigStore>,
    cache: Arc<TranslatorsCache>,
    scheduler: Arc<dyn TranslateScheduler>,
}

impl TranslationService {
    /// Service translating with the configured translator.
    pub fn new(
        config: Arc<ConfigStore>,
        cache: Arc<TranslatorsCache>,
        scheduler: Arc<dyn TranslateScheduler>,
    ) -> Self {
        Self {
            config,
            cache,
            scheduler,
        }
    }

    /// Translate `request`, through the cache when `scheduler.useCache` is on.
    pub async fn translate(&self, request: TranslateRequest) -> TranslatorResult<String> {
        let config = self.config.get_config().await?;
        let translator = config.translator_module;

        if !config.scheduler.use_cache {
            debug!(%translator, "translating without cache");
            return Ok(self.scheduler.translate(&translator, &request).await?);
        }

        let key = CacheKey::new(&translator, &request, config.cache.ignore_case);
        let scheduler = Arc::clone(&self.scheduler);
        let value = self
            .cache
            .get_or_translate(key, || async move { scheduler.translate(&translator, &request).await })
            .await?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TranslatorSet;
    use crate::scheduler::SchedulerError;
    use crate::TranslatorId;
    use async_trait::async_trait;
    use linguist_store::{InMemoryBackend, KeyValueBackend};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct SlowScheduler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TranslateScheduler for SlowScheduler {
        async fn translate(
            &self,
            translator: &TranslatorId,
            request: &TranslateRequest,
        ) -> Result<String, SchedulerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(format!("{translator}:{}", request.text.to_uppercase()))
        }

        fn set_translators(&self, _translators: TranslatorSet) {}
    }

    fn service() -> (Arc<ConfigStore>, Arc<TranslatorsCache>, Arc<SlowScheduler>, Arc<TranslationService>) {
        let backend: Arc<dyn KeyValueBackend> = Arc::new(InMemoryBackend::new());
        let config = Arc::new(ConfigStore::new(backend));
        let cache = Arc::new(TranslatorsCache::new());
        let scheduler = Arc::new(SlowScheduler::default());
        let service = Arc::new(TranslationService::new(config.clone(), cache.clone(), scheduler.clone()));
        (config, cache, scheduler, service)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_identical_requests_share_one_translation() {
        let (_, cache, scheduler, service) = service();
        let request = TranslateRequest::new("hello", "en", "de");
        let (a, b) = tokio::join!(service.translate(request.clone()), service.translate(request));
        assert_eq!(a.unwrap(), "GoogleTranslator:HELLO");
        assert_eq!(b.unwrap(), "GoogleTranslator:HELLO");
        assert_eq!(scheduler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn cache_ignores_case_by_default() {
        let (_, _, scheduler, service) = service();
        service.translate(TranslateRequest::new("Hello", "en", "de")).await.unwrap();
        service.translate(TranslateRequest::new("hello", "en", "de")).await.unwrap();
        assert_eq!(scheduler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_cache_goes_straight_to_scheduler() {
        let (config, cache, scheduler, service) = service();
        config
            .update(|mut cfg| {
                cfg.scheduler.use_cache = false;
                cfg
            })
            .await
            .unwrap();
        let request = TranslateRequest::new("hello", "en", "de");
        service.translate(request.clone()).await.unwrap();
        service.translate(request).await.unwrap();
        assert_eq!(scheduler.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
