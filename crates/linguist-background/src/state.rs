//! Persisted user state served by the background besides configuration.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use linguist_store::{KeyValueBackend, ObservableStore, StoreResult, StoreValue};

/// A translated text as stored in history and the dictionary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRecord {
    pub from: String,
    pub to: String,
    pub original_text: String,
    pub translated_text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub translation: TranslationRecord,
    /// Where the translation was made (popup, selection, page).
    #[serde(default)]
    pub origin: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    #[serde(flatten)]
    pub translation: TranslationRecord,
    pub date: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SitePreferences {
    pub enable_auto_translate: bool,
    /// Source languages to translate automatically on this site. Empty means
    /// the language preferences decide.
    pub auto_translate_languages: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LanguagePreferences {
    pub enable_auto_translate: bool,
}

/// Input state of the popup text translator, restored on reopen.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextTranslatorState {
    pub from: String,
    pub to: String,
    pub text: String,
    pub translation: Option<String>,
}

/// String-keyed preferences persisted as one map.
pub struct PreferenceMap<P> {
    store: ObservableStore<BTreeMap<String, P>>,
}

impl<P: StoreValue> PreferenceMap<P> {
    /// Map stored under `key`.
    pub fn new(backend: Arc<dyn KeyValueBackend>, key: &str) -> Self {
        Self {
            store: ObservableStore::new(backend, key, BTreeMap::new()),
        }
    }

    /// Preferences for `name`, if any were saved.
    pub async fn get(&self, name: &str) -> StoreResult<Option<P>> {
        Ok(self.store.get().await?.remove(name))
    }

    /// Save preferences for `name`, replacing earlier ones.
    pub async fn set(&self, name: String, preferences: P) -> StoreResult<()> {
        self.store
            .update(move |mut map| {
                map.insert(name, preferences);
                map
            })
            .await
            .map(|_| ())
    }

    /// Returns `true` if an entry was removed.
    pub async fn delete(&self, name: &str) -> StoreResult<bool> {
        let removed = self
            .store
            .try_update(|mut map| match map.remove(name) {
                Some(_) => Ok(map),
                None => Err(()),
            })
            .await?;
        Ok(removed.is_ok())
    }
}

/// Most recently used languages, newest first, without duplicates.
pub struct RecentLanguages {
    store: ObservableStore<Vec<String>>,
    limit: usize,
}

impl RecentLanguages {
    /// List stored under `key`, keeping at most `limit` entries.
    pub fn new(backend: Arc<dyn KeyValueBackend>, key: &str, limit: usize) -> Self {
        Self {
            store: ObservableStore::new(backend, key, Vec::new()),
            limit,
        }
    }

    /// Languages, most recently used first.
    pub async fn list(&self) -> StoreResult<Vec<String>> {
        self.store.get().await
    }

    /// Move `language` to the front and return the updated list.
    pub async fn add(&self, language: String) -> StoreResult<Vec<String>> {
        let limit = self.limit;
        self.store
            .update(move |mut languages| {
                languages.retain(|l| *l != language);
                languages.insert(0, language);
                languages.truncate(limit);
                languages
            })
            .await
    }
}

/// Persisted popup text translator state.
pub struct TextTranslatorStore {
    store: ObservableStore<Option<TextTranslatorState>>,
}

impl TextTranslatorStore {
    /// State stored under `key`.
    pub fn new(backend: Arc<dyn KeyValueBackend>, key: &str) -> Self {
        Self {
            store: ObservableStore::new(backend, key, None),
        }
    }

    /// Last saved state, if any.
    pub async fn get(&self) -> StoreResult<Option<TextTranslatorState>> {
        self.store.get().await
    }

    /// Replace the saved state.
    pub async fn set(&self, state: TextTranslatorState) -> StoreResult<()> {
        self.store.set(Some(state)).await
    }

    /// Drop the remembered text and translation, keeping the language pair.
    pub async fn forget_text(&self) -> StoreResult<()> {
        self.store
            .update(|state| {
                state.map(|s| TextTranslatorState {
                    text: String::new(),
                    translation: None,
                    ..s
                })
            })
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linguist_store::InMemoryBackend;
    use serde_json::json;

    fn backend() -> Arc<dyn KeyValueBackend> {
        Arc::new(InMemoryBackend::new())
    }

    #[tokio::test]
    async fn preference_map_crud() {
        let prefs: PreferenceMap<SitePreferences> = PreferenceMap::new(backend(), "sitePreferences");
        assert_eq!(prefs.get("example.com").await.unwrap(), None);

        let site = SitePreferences {
            enable_auto_translate: true,
            auto_translate_languages: vec!["fr".into()],
        };
        prefs.set("example.com".into(), site.clone()).await.unwrap();
        assert_eq!(prefs.get("example.com").await.unwrap(), Some(site));

        assert!(prefs.delete("example.com").await.unwrap());
        assert!(!prefs.delete("example.com").await.unwrap());
    }

    #[tokio::test]
    async fn recent_languages_are_capped_and_deduplicated() {
        let recent = RecentLanguages::new(backend(), "recentUsedLanguages", 3);
        for lang in ["en", "de", "fr", "de", "ja"] {
            recent.add(lang.into()).await.unwrap();
        }
        assert_eq!(recent.list().await.unwrap(), vec!["ja", "de", "fr"]);
    }

    #[tokio::test]
    async fn forgetting_text_keeps_languages() {
        let store = TextTranslatorStore::new(backend(), "textTranslator");
        store.forget_text().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);

        store
            .set(TextTranslatorState {
                from: "en".into(),
                to: "de".into(),
                text: "hello".into(),
                translation: Some("hallo".into()),
            })
            .await
            .unwrap();
        store.forget_text().await.unwrap();
        let state = store.get().await.unwrap().unwrap();
        assert_eq!((state.from.as_str(), state.to.as_str()), ("en", "de"));
        assert!(state.text.is_empty());
        assert_eq!(state.translation, None);
    }

    #[test]
    fn dictionary_entry_is_flat() {
        let entry = DictionaryEntry {
            translation: TranslationRecord {
                from: "en".into(),
                to: "de".into(),
                original_text: "cat".into(),
                translated_text: "Katze".into(),
            },
            date: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["originalText"], json!("cat"));
        assert!(value.get("translation").is_none());
    }
}
