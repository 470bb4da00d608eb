//! Translator registry and translation cache for Linguist.
//!
//! Translation itself is delegated to an external [`TranslateScheduler`].
//! This crate keeps track of which engines exist (builtin classes plus
//! user-defined ones), keeps the active translator in configuration valid,
//! and owns a per-translator response cache that is purged exactly when its
//! translator is deleted or redefined.

pub mod cache;
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod scheduler;
pub mod service;
pub mod tts;

pub use cache::{CacheEntry, CacheKey, TranslatorsCache};
pub use descriptor::{CustomTranslator, TranslatorInfo, TranslatorKind, TranslatorSet};
pub use error::{TranslatorError, TranslatorResult};
pub use linguist_config::TranslatorId;
pub use registry::{TranslatorRegistry, BUILTIN_TRANSLATORS, TRANSLATORS_COLLECTION};
pub use scheduler::{SchedulerError, TranslateOptions, TranslateRequest, TranslateScheduler};
pub use service::TranslationService;
pub use tts::{CustomTts, TtsRegistry, TTS_COLLECTION};
