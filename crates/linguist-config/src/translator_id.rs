use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Persisted tag marking a user-defined translator id (`#12`).
const CUSTOM_TAG: char = '#';

/// Identity of a translation engine.
///
/// Built once from the persisted string form at the data boundary; nothing
/// downstream inspects the raw string again.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TranslatorId {
    /// A translator shipped with the application, identified by its class name.
    Builtin(String),
    /// A user-defined translator, identified by its record id.
    Custom(u64),
}

impl TranslatorId {
    /// Id of a shipped engine.
    pub fn builtin(name: impl Into<String>) -> Self {
        Self::Builtin(name.into())
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslatorIdError {
    #[error("translator id is empty")]
    Empty,

    #[error("custom translator id {0:?} is not `#<number>`")]
    MalformedCustom(String),
}

impl FromStr for TranslatorId {
    type Err = TranslatorIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() {
            return Err(TranslatorIdError::Empty);
        }
        match raw.strip_prefix(CUSTOM_TAG) {
            Some(tail) => tail
                .parse::<u64>()
                .map(Self::Custom)
                .map_err(|_| TranslatorIdError::MalformedCustom(raw.to_string())),
            None => Ok(Self::Builtin(raw.to_string())),
        }
    }
}

impl fmt::Display for TranslatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(name) => f.write_str(name),
            Self::Custom(id) => write!(f, "{CUSTOM_TAG}{id}"),
        }
    }
}

impl Serialize for TranslatorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TranslatorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
