//! Request-name vocabulary understood by the background.
//!
//! Names are part of the wire contract: additions must stay backward
//! compatible, and a name the background does not know degrades to
//! `UnknownRequest` on the caller side.

pub const TRANSLATE: &str = "translate";
pub const GET_AVAILABLE_TRANSLATORS: &str = "getAvailableTranslators";
pub const CLEAR_CACHE: &str = "clearCache";

pub const GET_CONFIG: &str = "getConfig";
pub const SET_CONFIG: &str = "setConfig";
pub const RESET_CONFIG: &str = "resetConfig";
pub const UPDATE_CONFIG: &str = "updateConfig";

pub const GET_LANGUAGE_PREFERENCES: &str = "getLanguagePreferences";
pub const ADD_LANGUAGE_PREFERENCES: &str = "addLanguagePreferences";
pub const DELETE_LANGUAGE_PREFERENCES: &str = "deleteLanguagePreferences";
pub const SET_SITE_PREFERENCES: &str = "setSitePreferences";
pub const GET_SITE_PREFERENCES: &str = "getSitePreferences";
pub const DELETE_SITE_PREFERENCES: &str = "deleteSitePreferences";

pub const ADD_TRANSLATION: &str = "addTranslation";
pub const DELETE_TRANSLATION: &str = "deleteTranslation";
pub const FIND_TRANSLATION: &str = "findTranslation";
pub const GET_TRANSLATIONS: &str = "getTranslations";
pub const CLEAR_TRANSLATIONS: &str = "clearTranslations";

pub const ADD_TRANSLATOR: &str = "addTranslator";
pub const UPDATE_TRANSLATOR: &str = "updateTranslator";
pub const DELETE_TRANSLATOR: &str = "deleteTranslator";
pub const GET_TRANSLATORS: &str = "getTranslators";
pub const APPLY_TRANSLATORS: &str = "applyTranslators";

pub const ADD_TTS: &str = "addTts";
pub const UPDATE_TTS: &str = "updateTts";
pub const DELETE_TTS: &str = "deleteTts";
pub const GET_TTS_LIST: &str = "getTtsList";

pub const ADD_HISTORY_ENTRY: &str = "addHistoryEntry";
pub const GET_HISTORY_ENTRIES: &str = "getHistoryEntries";
pub const DELETE_HISTORY_ENTRY: &str = "deleteHistoryEntry";
pub const CLEAR_HISTORY: &str = "clearHistory";

pub const GET_RECENT_USED_LANGUAGES: &str = "getRecentUsedLanguages";
pub const ADD_RECENT_USED_LANGUAGE: &str = "addRecentUsedLanguage";

pub const GET_TEXT_TRANSLATOR_STATE: &str = "getTextTranslatorState";
pub const SET_TEXT_TRANSLATOR_STATE: &str = "setTextTranslatorState";

pub const PING: &str = "ping";

/// Event broadcast whenever the configuration changes.
pub const APP_CONFIG_UPDATE: &str = "appConfigUpdate";

/// Registered last; success means every other handler is live.
pub const READINESS: &str = PING;
