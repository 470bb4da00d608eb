use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use linguist_store::{path, KeyValueBackend, Observable, ObservableStore};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::AppConfig;

/// Backend key holding the configuration document.
pub const CONFIG_KEY: &str = "config";

/// Result of a partial configuration update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub success: bool,
    /// Per-path rejection reasons. Empty on success.
    pub errors: BTreeMap<String, String>,
}

impl UpdateOutcome {
    fn committed() -> Self {
        Self {
            success: true,
            errors: BTreeMap::new(),
        }
    }

    fn rejected(errors: BTreeMap<String, String>) -> Self {
        Self {
            success: false,
            errors,
        }
    }
}

/// The observable store specialized to [`AppConfig`].
///
/// Snapshots are never mutated in place: each commit replaces the whole
/// document, and watchers see the new immutable snapshot.
pub struct ConfigStore {
    store: ObservableStore<AppConfig>,
}

impl ConfigStore {
    /// Configuration stored under [`CONFIG_KEY`].
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self {
            store: ObservableStore::new(backend, CONFIG_KEY, AppConfig::default()),
        }
    }

    /// The full configuration, with defaults for anything unset.
    pub async fn get_config(&self) -> ConfigResult<AppConfig> {
        Ok(self.store.get().await?)
    }

    /// Read one dotted option path.
    pub async fn get_option(&self, option: &str) -> ConfigResult<Value> {
        Ok(self.store.get_at(option).await?)
    }

    /// Replace the whole snapshot (import).
    pub async fn set_config(&self, full: AppConfig) -> ConfigResult<()> {
        let errors: BTreeMap<String, String> = full.validate().into_iter().collect();
        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }
        self.store.set(full).await?;
        info!("configuration replaced");
        Ok(())
    }

    /// Restore schema defaults.
    pub async fn reset_config(&self) -> ConfigResult<()> {
        self.store.set(AppConfig::default()).await?;
        info!("configuration reset to defaults");
        Ok(())
    }

    /// Apply a sparse set of `path -> value` changes.
    ///
    /// Each path is validated on its own against the current snapshot. If any
    /// path is rejected nothing is committed and the per-path errors are
    /// returned instead of raised. Object values are merged into the existing
    /// section rather than replacing it.
    pub async fn update_config(&self, changes: BTreeMap<String, Value>) -> ConfigResult<UpdateOutcome> {
        let paths: Vec<String> = changes.keys().cloned().collect();
        let result = self
            .store
            .try_update(move |current| apply_changes(&current, &changes))
            .await?;
        match result {
            Ok(_) => {
                debug!(?paths, "configuration updated");
                Ok(UpdateOutcome::committed())
            }
            Err(errors) => {
                debug!(?errors, "configuration update rejected");
                Ok(UpdateOutcome::rejected(errors))
            }
        }
    }

    /// Internal read-modify-write for corrective updates made by services.
    pub async fn update<F>(&self, updater: F) -> ConfigResult<AppConfig>
    where
        F: FnOnce(AppConfig) -> AppConfig + Send,
    {
        Ok(self.store.update(updater).await?)
    }

    /// Observable over committed configurations.
    pub async fn observable(&self) -> ConfigResult<Observable<AppConfig, AppConfig>> {
        Ok(self.store.get_observable().await?)
    }

    pub fn watcher_count(&self) -> usize {
        self.store.watcher_count()
    }
}

fn apply_changes(
    current: &AppConfig,
    changes: &BTreeMap<String, Value>,
) -> Result<AppConfig, BTreeMap<String, String>> {
    let base = current.to_document();
    let mut merged = base.clone();
    let mut errors = BTreeMap::new();

    for (option, value) in changes {
        let mut trial = base.clone();
        if let Err(msg) = assign(&mut trial, option, value) {
            errors.insert(option.clone(), msg);
            continue;
        }
        match serde_json::from_value::<AppConfig>(trial) {
            Ok(candidate) => {
                let violation = candidate
                    .validate()
                    .into_iter()
                    .find(|(p, _)| p == option || p.starts_with(&format!("{option}.")));
                if let Some((p, msg)) = violation {
                    errors.insert(option.clone(), format!("{p}: {msg}"));
                    continue;
                }
            }
            Err(e) => {
                errors.insert(option.clone(), e.to_string());
                continue;
            }
        }
        // Validated against `base` above, so this cannot fail.
        let _ = assign(&mut merged, option, value);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let next: AppConfig = serde_json::from_value(merged).map_err(|e| {
        BTreeMap::from([(String::from("<root>"), e.to_string())])
    })?;
    let violations: BTreeMap<String, String> = next.validate().into_iter().collect();
    if !violations.is_empty() {
        return Err(violations);
    }
    Ok(next)
}

/// Write `value` at `option` inside `doc`, merging objects key by key.
fn assign(doc: &mut Value, option: &str, value: &Value) -> Result<(), String> {
    let Some(target) = path::get_path(doc, option) else {
        return Err("unknown option".into());
    };
    let mut next = target.clone();
    merge(&mut next, value, option)?;
    path::set_path(doc, option, next);
    Ok(())
}

fn merge(target: &mut Value, value: &Value, at: &str) -> Result<(), String> {
    match (target.as_object_mut(), value.as_object()) {
        (Some(existing), Some(patch)) => {
            for (key, child) in patch {
                let child_path = format!("{at}.{key}");
                match existing.get_mut(key) {
                    Some(slot) => merge(slot, child, &child_path)?,
                    None => return Err(format!("unknown option {child_path}")),
                }
            }
            Ok(())
        }
        _ => {
            *target = value.clone();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SelectTranslatorMode;
    use crate::translator_id::TranslatorId;
    use linguist_store::InMemoryBackend;
    use serde_json::json;

    fn store() -> (Arc<InMemoryBackend>, ConfigStore) {
        let backend = Arc::new(InMemoryBackend::new());
        (backend.clone(), ConfigStore::new(backend))
    }

    fn changes(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[tokio::test]
    async fn empty_backend_yields_defaults() {
        let (_, store) = store();
        assert_eq!(store.get_config().await.unwrap(), AppConfig::default());
        assert_eq!(store.get_option("scheduler.useCache").await.unwrap(), json!(true));
    }

    #[tokio::test]
    async fn set_then_get_roundtrip() {
        let (_, store) = store();
        let mut full = AppConfig::default();
        full.language = "ko".into();
        full.translator_module = TranslatorId::Custom(4);
        full.select_translator.mode = SelectTranslatorMode::QuickTranslate;
        store.set_config(full.clone()).await.unwrap();
        assert_eq!(store.get_config().await.unwrap(), full);
    }

    #[tokio::test]
    async fn set_rejects_out_of_range_snapshot() {
        let (_, store) = store();
        let mut full = AppConfig::default();
        full.scheduler.translate_retry_attempt_limit = 99;
        let err = store.set_config(full).await.unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref e) if e.contains_key("scheduler.translateRetryAttemptLimit")));
        assert_eq!(store.get_config().await.unwrap(), AppConfig::default());
    }

    #[tokio::test]
    async fn update_applies_sparse_changes() {
        let (_, store) = store();
        let outcome = store
            .update_config(changes(&[
                ("scheduler.useCache", json!(false)),
                ("language", json!("es")),
            ]))
            .await
            .unwrap();
        assert!(outcome.success);
        assert!(outcome.errors.is_empty());
        let cfg = store.get_config().await.unwrap();
        assert!(!cfg.scheduler.use_cache);
        assert_eq!(cfg.language, "es");
    }

    #[tokio::test]
    async fn update_is_all_or_nothing() {
        let (_, store) = store();
        let outcome = store
            .update_config(changes(&[
                ("language", json!("es")),
                ("scheduler.useCache", json!("nope")),
                ("scheduler.unknown", json!(1)),
                ("scheduler.translatePoolDelay", json!(999_999)),
            ]))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.errors.len(), 3);
        assert!(outcome.errors.contains_key("scheduler.useCache"));
        assert_eq!(outcome.errors["scheduler.unknown"], "unknown option");
        assert!(outcome.errors.contains_key("scheduler.translatePoolDelay"));
        assert_eq!(store.get_config().await.unwrap(), AppConfig::default());
    }

    #[tokio::test]
    async fn object_values_merge_into_section() {
        let (_, store) = store();
        let outcome = store
            .update_config(changes(&[("selectTranslator", json!({ "mode": "contextMenu" }))]))
            .await
            .unwrap();
        assert!(outcome.success);
        let cfg = store.get_config().await.unwrap();
        assert_eq!(cfg.select_translator.mode, SelectTranslatorMode::ContextMenu);
        assert!(cfg.select_translator.enabled);

        let outcome = store
            .update_config(changes(&[("selectTranslator", json!({ "bogus": true }))]))
            .await
            .unwrap();
        assert_eq!(outcome.errors["selectTranslator"], "unknown option selectTranslator.bogus");
    }

    #[tokio::test]
    async fn invalid_translator_id_is_rejected() {
        let (_, store) = store();
        let outcome = store
            .update_config(changes(&[("translatorModule", json!("#not-a-number"))]))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.errors.contains_key("translatorModule"));
    }

    #[tokio::test]
    async fn storage_failure_is_raised_not_reported() {
        let (backend, store) = store();
        backend.set_fail_writes(true);
        let err = store
            .update_config(changes(&[("language", json!("es"))]))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Store(_)));
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let (_, store) = store();
        store
            .update_config(changes(&[("history.enabled", json!(true))]))
            .await
            .unwrap();
        store.reset_config().await.unwrap();
        assert_eq!(store.get_config().await.unwrap(), AppConfig::default());
    }
}
