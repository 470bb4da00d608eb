use std::sync::Arc;

use linguist_config::ConfigStore;
use linguist_store::{Collection, KeyValueBackend};
use linguist_translators::{TranslationService, TranslatorRegistry, TranslatorsCache, TtsRegistry};

use crate::collaborators::Collaborators;
use crate::state::{
    DictionaryEntry, HistoryEntry, LanguagePreferences, PreferenceMap, RecentLanguages, SitePreferences,
    TextTranslatorStore,
};

pub const HISTORY_COLLECTION: &str = "history";
pub const DICTIONARY_COLLECTION: &str = "dictionary";
pub const SITE_PREFERENCES_KEY: &str = "sitePreferences";
pub const LANGUAGE_PREFERENCES_KEY: &str = "languagePreferences";
pub const RECENT_LANGUAGES_KEY: &str = "recentUsedLanguages";
pub const TEXT_TRANSLATOR_KEY: &str = "textTranslator";

pub const MAX_RECENT_LANGUAGES: usize = 10;
/// Oldest history entries are dropped beyond this count.
pub const MAX_HISTORY_ENTRIES: usize = 10_000;

/// The services request handlers run against. Built once during start-up and
/// shared by every handler and reaction.
pub struct Services {
    pub config: Arc<ConfigStore>,
    pub cache: Arc<TranslatorsCache>,
    pub translators: TranslatorRegistry,
    pub translation: TranslationService,
    pub tts: TtsRegistry,
    pub history: Collection<HistoryEntry>,
    pub dictionary: Collection<DictionaryEntry>,
    pub site_preferences: PreferenceMap<SitePreferences>,
    pub language_preferences: PreferenceMap<LanguagePreferences>,
    pub recent_languages: RecentLanguages,
    pub text_translator: TextTranslatorStore,
}

impl Services {
    /// Wire every service over `backend`, sharing one cache and scheduler.
    pub fn build(
        backend: Arc<dyn KeyValueBackend>,
        config: Arc<ConfigStore>,
        collaborators: &Collaborators,
    ) -> Self {
        let cache = Arc::new(TranslatorsCache::new());
        let scheduler = Arc::clone(&collaborators.scheduler);
        Self {
            translators: TranslatorRegistry::new(
                Arc::clone(&backend),
                collaborators.builtin_translators.clone(),
                Arc::clone(&config),
                Arc::clone(&cache),
                Arc::clone(&scheduler),
            ),
            translation: TranslationService::new(Arc::clone(&config), Arc::clone(&cache), scheduler),
            tts: TtsRegistry::new(Arc::clone(&backend)),
            history: Collection::new(Arc::clone(&backend), HISTORY_COLLECTION),
            dictionary: Collection::new(Arc::clone(&backend), DICTIONARY_COLLECTION),
            site_preferences: PreferenceMap::new(Arc::clone(&backend), SITE_PREFERENCES_KEY),
            language_preferences: PreferenceMap::new(Arc::clone(&backend), LANGUAGE_PREFERENCES_KEY),
            recent_languages: RecentLanguages::new(Arc::clone(&backend), RECENT_LANGUAGES_KEY, MAX_RECENT_LANGUAGES),
            text_translator: TextTranslatorStore::new(backend, TEXT_TRANSLATOR_KEY),
            config,
            cache,
        }
    }
}
