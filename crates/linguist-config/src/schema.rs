use serde::{Deserialize, Serialize};
use serde_json::Value;

use linguist_store::path;

use crate::translator_id::TranslatorId;

/// Translator selected when nothing else is configured or the configured
/// custom translator disappeared.
pub const DEFAULT_TRANSLATOR: &str = "GoogleTranslator";

/// Longest pause between scheduled translation batches, in milliseconds.
const MAX_POOL_DELAY_MS: u64 = 60_000;
const MAX_RETRY_ATTEMPTS: u32 = 10;

/// The application settings schema.
///
/// Every field is defaulted, so a partially persisted document always
/// deserializes into a complete snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub translator_module: TranslatorId,
    pub language: String,
    pub tts_module: String,
    pub scheduler: SchedulerConfig,
    pub cache: CacheConfig,
    pub text_translator: TextTranslatorConfig,
    pub select_translator: SelectTranslatorConfig,
    pub page_translator: PageTranslatorConfig,
    pub history: HistoryConfig,
    pub app_icon: AppIconConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            translator_module: TranslatorId::builtin(DEFAULT_TRANSLATOR),
            language: "en".into(),
            tts_module: "google".into(),
            scheduler: SchedulerConfig::default(),
            cache: CacheConfig::default(),
            text_translator: TextTranslatorConfig::default(),
            select_translator: SelectTranslatorConfig::default(),
            page_translator: PageTranslatorConfig::default(),
            history: HistoryConfig::default(),
            app_icon: AppIconConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerConfig {
    pub use_cache: bool,
    pub translate_retry_attempt_limit: u32,
    pub is_allow_direct_translate_bad_chunks: bool,
    pub direct_translate_length: Option<u32>,
    pub translate_pool_delay: u64,
    pub chunk_size_for_instant_translate: Option<u32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            translate_retry_attempt_limit: 2,
            is_allow_direct_translate_bad_chunks: true,
            direct_translate_length: None,
            translate_pool_delay: 300,
            chunk_size_for_instant_translate: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    pub ignore_case: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ignore_case: true }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextTranslatorConfig {
    pub remember_text: bool,
    pub spell_check: bool,
    pub suggest_language: bool,
    pub suggest_language_always: bool,
}

impl Default for TextTranslatorConfig {
    fn default() -> Self {
        Self {
            remember_text: true,
            spell_check: true,
            suggest_language: true,
            suggest_language_always: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectTranslatorMode {
    #[default]
    PopupButton,
    QuickTranslate,
    ContextMenu,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectTranslatorConfig {
    pub enabled: bool,
    pub mode: SelectTranslatorMode,
    pub show_original_text: bool,
}

impl Default for SelectTranslatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: SelectTranslatorMode::PopupButton,
            show_original_text: true,
        }
    }
}

impl SelectTranslatorConfig {
    /// Whether the translate-selection context menu should be registered.
    pub fn context_menu_enabled(&self) -> bool {
        self.enabled && self.mode == SelectTranslatorMode::ContextMenu
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageTranslatorConfig {
    pub enable_context_menu: bool,
    pub original_text_popup: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryConfig {
    pub enabled: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppIconType {
    #[default]
    Universal,
    Color,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppIconConfig {
    #[serde(rename = "type")]
    pub icon_type: AppIconType,
}

impl AppConfig {
    /// Range checks the type system cannot express. Returns `(path, message)`
    /// pairs; empty means valid.
    pub fn validate(&self) -> Vec<(String, String)> {
        let mut errors = Vec::new();
        let mut fail = |path: &str, msg: &str| errors.push((path.to_string(), msg.to_string()));

        if self.language.trim().is_empty() {
            fail("language", "must not be empty");
        }
        if self.tts_module.trim().is_empty() {
            fail("ttsModule", "must not be empty");
        }
        let scheduler = &self.scheduler;
        if scheduler.translate_retry_attempt_limit > MAX_RETRY_ATTEMPTS {
            fail(
                "scheduler.translateRetryAttemptLimit",
                &format!("must be at most {MAX_RETRY_ATTEMPTS}"),
            );
        }
        if scheduler.translate_pool_delay > MAX_POOL_DELAY_MS {
            fail(
                "scheduler.translatePoolDelay",
                &format!("must be at most {MAX_POOL_DELAY_MS}ms"),
            );
        }
        if scheduler.direct_translate_length == Some(0) {
            fail("scheduler.directTranslateLength", "must be positive");
        }
        if scheduler.chunk_size_for_instant_translate == Some(0) {
            fail("scheduler.chunkSizeForInstantTranslate", "must be positive");
        }
        errors
    }

    /// Rebuild a snapshot from an arbitrary persisted document.
    ///
    /// Known leaves whose stored value fits the schema are kept; anything
    /// unknown or ill-typed falls back to the default. Returns the snapshot
    /// and the paths that were reset.
    pub fn normalize(stored: &Value) -> (Self, Vec<String>) {
        let defaults = Self::default().to_document();
        let mut accepted = defaults.clone();
        let mut reset = Vec::new();
        let mut leaves = Vec::new();
        collect_leaves(&defaults, String::new(), &mut leaves);

        for leaf in leaves {
            let Some(value) = path::get_path(stored, &leaf) else {
                continue;
            };
            let mut candidate = accepted.clone();
            path::set_path(&mut candidate, &leaf, value.clone());
            let fits = serde_json::from_value::<Self>(candidate.clone())
                .map(|cfg| !cfg.validate().iter().any(|(p, _)| *p == leaf))
                .unwrap_or(false);
            if fits {
                accepted = candidate;
            } else {
                reset.push(leaf);
            }
        }

        let config = serde_json::from_value(accepted).unwrap_or_default();
        (config, reset)
    }

    /// The configuration as a JSON document.
    pub fn to_document(&self) -> Value {
        // Plain data with string keys: serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn collect_leaves(node: &Value, prefix: String, out: &mut Vec<String>) {
    match node.as_object() {
        Some(obj) => {
            for (key, child) in obj {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_leaves(child, path, out);
            }
        }
        None => out.push(prefix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_cover_every_path() {
        let doc = AppConfig::default().to_document();
        assert_eq!(path::get_path(&doc, "scheduler.useCache"), Some(&json!(true)));
        assert_eq!(path::get_path(&doc, "translatorModule"), Some(&json!("GoogleTranslator")));
        assert_eq!(path::get_path(&doc, "appIcon.type"), Some(&json!("universal")));
        assert_eq!(path::get_path(&doc, "selectTranslator.mode"), Some(&json!("popupButton")));
        assert_eq!(path::get_path(&doc, "scheduler.directTranslateLength"), Some(&json!(null)));
    }

    #[test]
    fn partial_document_is_default_filled() {
        let cfg: AppConfig = serde_json::from_value(json!({ "language": "de" })).unwrap();
        assert_eq!(cfg.language, "de");
        assert!(cfg.scheduler.use_cache);
        assert_eq!(cfg.translator_module, TranslatorId::builtin(DEFAULT_TRANSLATOR));
    }

    #[test]
    fn validate_reports_ranges() {
        let mut cfg = AppConfig::default();
        assert!(cfg.validate().is_empty());
        cfg.scheduler.translate_pool_delay = 120_000;
        cfg.scheduler.direct_translate_length = Some(0);
        let paths: Vec<String> = cfg.validate().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            vec!["scheduler.translatePoolDelay", "scheduler.directTranslateLength"]
        );
    }

    #[test]
    fn context_menu_flag() {
        let mut select = SelectTranslatorConfig::default();
        assert!(!select.context_menu_enabled());
        select.mode = SelectTranslatorMode::ContextMenu;
        assert!(select.context_menu_enabled());
        select.enabled = false;
        assert!(!select.context_menu_enabled());
    }

    #[test]
    fn normalize_keeps_valid_and_resets_invalid() {
        let stored = json!({
            "language": "fr",
            "scheduler": { "useCache": "yes", "translatePoolDelay": 500 },
            "selectTranslator": { "mode": "contextMenu" },
            "obsoleteOption": 1,
            "translatorModule": "#oops",
        });
        let (cfg, reset) = AppConfig::normalize(&stored);
        assert_eq!(cfg.language, "fr");
        assert_eq!(cfg.scheduler.translate_pool_delay, 500);
        assert!(cfg.scheduler.use_cache);
        assert_eq!(cfg.select_translator.mode, SelectTranslatorMode::ContextMenu);
        assert_eq!(cfg.translator_module, TranslatorId::builtin(DEFAULT_TRANSLATOR));
        assert!(reset.contains(&"scheduler.useCache".to_string()));
        assert!(reset.contains(&"translatorModule".to_string()));
    }

    #[test]
    fn normalize_is_idempotent() {
        let (once, _) = AppConfig::normalize(&json!({ "language": "uk", "history": { "enabled": true } }));
        let (twice, reset) = AppConfig::normalize(&once.to_document());
        assert_eq!(once, twice);
        assert!(reset.is_empty());
    }
}
