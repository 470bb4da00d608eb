use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use linguist_store::{Collection, KeyValueBackend, Record, RecordId, StoreError};

use crate::error::{TranslatorError, TranslatorResult};

pub const TTS_COLLECTION: &str = "tts";

/// A user-defined text-to-speech module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTts {
    pub name: String,
    pub code: String,
}

impl CustomTts {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

/// Persisted custom TTS modules.
pub struct TtsRegistry {
    modules: Collection<CustomTts>,
}

impl TtsRegistry {
    /// Registry over the [`TTS_COLLECTION`] collection.
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self {
            modules: Collection::new(backend, TTS_COLLECTION),
        }
    }

    /// Store a module and return its record id.
    pub async fn add(&self, module: CustomTts) -> TranslatorResult<RecordId> {
        if module.name.trim().is_empty() {
            return Err(TranslatorError::InvalidDefinition("name must not be empty".into()));
        }
        let id = self.modules.add(module).await?;
        info!(id, "custom tts added");
        Ok(id)
    }

    /// Replace module `id`.
    pub async fn update(&self, id: RecordId, module: CustomTts) -> TranslatorResult<()> {
        self.modules.update(id, module).await.map_err(|e| match e {
            StoreError::RecordNotFound { .. } => TranslatorError::NotFound(id),
            other => other.into(),
        })
    }

    /// Remove module `id`.
    pub async fn delete(&self, id: RecordId) -> TranslatorResult<()> {
        if self.modules.delete(id).await? {
            Ok(())
        } else {
            Err(TranslatorError::NotFound(id))
        }
    }

    /// Stored modules, ordered by id.
    pub async fn list(&self) -> TranslatorResult<Vec<Record<CustomTts>>> {
        Ok(self.modules.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linguist_store::InMemoryBackend;

    #[tokio::test]
    async fn crud() {
        let tts = TtsRegistry::new(Arc::new(InMemoryBackend::new()));
        let id = tts.add(CustomTts::new("Voice", "speak()")).await.unwrap();
        tts.update(id, CustomTts::new("Voice 2", "speak2()")).await.unwrap();
        let listed = tts.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].data.name, "Voice 2");

        tts.delete(id).await.unwrap();
        assert!(matches!(tts.delete(id).await, Err(TranslatorError::NotFound(_))));
        assert!(tts.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn nameless_module_is_rejected() {
        let tts = TtsRegistry::new(Arc::new(InMemoryBackend::new()));
        assert!(tts.add(CustomTts::new(" ", "x")).await.is_err());
    }
}
