//! Application settings for Linguist.
//!
//! [`AppConfig`] is the settings schema: every field has a default, so every
//! known dotted path always resolves to a value. [`ConfigStore`] specializes
//! the observable store to that schema and adds validated, all-or-nothing
//! partial updates. [`Migrator`] upgrades whatever persisted shape exists to
//! the current schema and must complete before the store is built.

pub mod error;
pub mod migration;
pub mod schema;
pub mod store;
pub mod translator_id;

pub use error::{ConfigError, ConfigResult};
pub use migration::{migrate_all, Migration, MigrationReport, Migrator};
pub use schema::{
    AppConfig, AppIconConfig, AppIconType, CacheConfig, HistoryConfig, PageTranslatorConfig,
    SchedulerConfig, SelectTranslatorConfig, SelectTranslatorMode, TextTranslatorConfig,
    DEFAULT_TRANSLATOR,
};
pub use store::{ConfigStore, UpdateOutcome, CONFIG_KEY};
pub use translator_id::{TranslatorId, TranslatorIdError};
