use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("store error: {0}")]
    Store(#[from] linguist_store::StoreError),

    #[error("invalid configuration: {}", format_errors(.0))]
    Invalid(BTreeMap<String, String>),

    #[error("persisted schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("migration {name} failed: {reason}")]
    Migration { name: &'static str, reason: String },
}

fn format_errors(errors: &BTreeMap<String, String>) -> String {
    errors
        .iter()
        .map(|(path, msg)| format!("{path}: {msg}"))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type ConfigResult<T> = Result<T, ConfigError>;
