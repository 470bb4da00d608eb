//! Persisted-state migrations.
//!
//! Migrations run in version order before the [`ConfigStore`](crate::ConfigStore)
//! is built. The highest applied version is recorded under
//! [`MIGRATIONS_KEY`] after each step, so re-running is a no-op and an
//! interrupted run resumes at the first unapplied step.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use linguist_store::KeyValueBackend;

use crate::error::{ConfigError, ConfigResult};
use crate::schema::AppConfig;
use crate::store::CONFIG_KEY;

pub const MIGRATIONS_KEY: &str = "migrations";

/// Key used by releases that stored the whole configuration as `appConfig`.
pub const LEGACY_CONFIG_KEY: &str = "appConfig";

/// A single versioned upgrade of persisted state.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Strictly increasing across the migration list.
    fn version(&self) -> u32;

    fn name(&self) -> &'static str;

    async fn migrate(&self, backend: &dyn KeyValueBackend) -> ConfigResult<()>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct MigrationState {
    version: u32,
}

/// What a [`Migrator::run`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    pub applied: Vec<&'static str>,
}

impl MigrationReport {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

/// Ordered list of migrations.
pub struct Migrator {
    migrations: Vec<Box<dyn Migration>>,
}

impl Migrator {
    /// The migrations shipped with this release.
    pub fn standard() -> Self {
        Self::with_migrations(vec![Box::new(MoveLegacyConfig), Box::new(NormalizeConfig)])
    }

    /// Migrator over `migrations`, which must be in version order.
    pub fn with_migrations(mut migrations: Vec<Box<dyn Migration>>) -> Self {
        migrations.sort_by_key(|m| m.version());
        Self { migrations }
    }

    /// Version reached once every migration has run.
    pub fn latest_version(&self) -> u32 {
        self.migrations.last().map(|m| m.version()).unwrap_or(0)
    }

    /// Apply every migration newer than the persisted version.
    pub async fn run(&self, backend: &dyn KeyValueBackend) -> ConfigResult<MigrationReport> {
        let state = read_state(backend).await?;
        let latest = self.latest_version();
        if state.version > latest {
            return Err(ConfigError::UnsupportedVersion {
                found: state.version,
                supported: latest,
            });
        }

        let mut report = MigrationReport {
            from_version: state.version,
            to_version: state.version,
            applied: Vec::new(),
        };
        for migration in self.migrations.iter().filter(|m| m.version() > state.version) {
            info!(version = migration.version(), name = migration.name(), "applying migration");
            migration.migrate(backend).await?;
            write_state(backend, MigrationState { version: migration.version() }).await?;
            report.to_version = migration.version();
            report.applied.push(migration.name());
        }
        Ok(report)
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::standard()
    }
}

/// Run the standard migrations against `backend`.
pub async fn migrate_all(backend: &dyn KeyValueBackend) -> ConfigResult<MigrationReport> {
    Migrator::standard().run(backend).await
}

async fn read_state(backend: &dyn KeyValueBackend) -> ConfigResult<MigrationState> {
    match backend.get(MIGRATIONS_KEY).await? {
        Some(raw) => serde_json::from_value(raw).map_err(|e| ConfigError::Migration {
            name: "read-state",
            reason: e.to_string(),
        }),
        None => Ok(MigrationState::default()),
    }
}

async fn write_state(backend: &dyn KeyValueBackend, state: MigrationState) -> ConfigResult<()> {
    let raw = serde_json::to_value(state).map_err(|e| ConfigError::Migration {
        name: "write-state",
        reason: e.to_string(),
    })?;
    backend.set(MIGRATIONS_KEY, raw).await?;
    Ok(())
}

/// v1: move the `appConfig` document to `config`. A document already under
/// `config` wins and the legacy copy is dropped.
struct MoveLegacyConfig;

#[async_trait]
impl Migration for MoveLegacyConfig {
    fn version(&self) -> u32 {
        1
    }

    fn name(&self) -> &'static str {
        "move-legacy-config"
    }

    async fn migrate(&self, backend: &dyn KeyValueBackend) -> ConfigResult<()> {
        let Some(legacy) = backend.get(LEGACY_CONFIG_KEY).await? else {
            return Ok(());
        };
        if !backend.contains(CONFIG_KEY).await? {
            backend.set(CONFIG_KEY, legacy).await?;
        }
        backend.remove(LEGACY_CONFIG_KEY).await?;
        Ok(())
    }
}

/// v2: rewrite the stored document against the current schema. Unknown keys
/// are dropped, ill-typed values and custom translator ids that are not
/// `#<number>` fall back to defaults.
struct NormalizeConfig;

#[async_trait]
impl Migration for NormalizeConfig {
    fn version(&self) -> u32 {
        2
    }

    fn name(&self) -> &'static str {
        "normalize-config"
    }

    async fn migrate(&self, backend: &dyn KeyValueBackend) -> ConfigResult<()> {
        let Some(stored) = backend.get(CONFIG_KEY).await? else {
            return Ok(());
        };
        let (config, reset) = AppConfig::normalize(&stored);
        if !reset.is_empty() {
            warn!(?reset, "persisted options reset to defaults");
        }
        backend.set(CONFIG_KEY, config.to_document()).await?;
        Ok(())
    }
}
