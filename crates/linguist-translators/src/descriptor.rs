use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{TranslatorError, TranslatorResult};
use crate::TranslatorId;

/// A user-defined translator as persisted: a display name and the module
/// source the scheduler evaluates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTranslator {
    pub name: String,
    pub code: String,
}

impl CustomTranslator {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }

    /// Reject blank names and empty code.
    pub fn validate(&self) -> TranslatorResult<()> {
        if self.name.trim().is_empty() {
            return Err(TranslatorError::InvalidDefinition("name must not be empty".into()));
        }
        if self.code.trim().is_empty() {
            return Err(TranslatorError::InvalidDefinition("code must not be empty".into()));
        }
        Ok(())
    }
}

/// How the scheduler obtains an engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TranslatorKind {
    Builtin,
    Custom { code: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatorInfo {
    pub name: String,
    #[serde(flatten)]
    pub kind: TranslatorKind,
}

/// Every translator currently usable, keyed by id.
pub type TranslatorSet = BTreeMap<TranslatorId, TranslatorInfo>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn definition_validation() {
        assert!(CustomTranslator::new("Mine", "class X {}").validate().is_ok());
        assert!(CustomTranslator::new(" ", "class X {}").validate().is_err());
        assert!(CustomTranslator::new("Mine", "").validate().is_err());
    }

    #[test]
    fn set_serializes_with_string_keys() {
        let mut set = TranslatorSet::new();
        set.insert(
            TranslatorId::builtin("GoogleTranslator"),
            TranslatorInfo { name: "GoogleTranslator".into(), kind: TranslatorKind::Builtin },
        );
        set.insert(
            TranslatorId::Custom(2),
            TranslatorInfo { name: "Mine".into(), kind: TranslatorKind::Custom { code: "x".into() } },
        );
        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["#2"], json!({ "name": "Mine", "kind": "custom", "code": "x" }));
        assert_eq!(value["GoogleTranslator"]["kind"], json!("builtin"));
    }
}
