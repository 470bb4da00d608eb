use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::descriptor::TranslatorSet;
use crate::TranslatorId;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranslateOptions {
    pub context: Option<String>,
    pub priority: Option<i32>,
    pub direct_translate: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub text: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub options: Option<TranslateOptions>,
}

impl TranslateRequest {
    pub fn new(text: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            from: from.into(),
            to: to.into(),
            options: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("translator {0} is not available")]
    UnknownTranslator(String),

    #[error("translation failed: {0}")]
    Failed(String),

    #[error("translation timed out")]
    Timeout,
}

/// The external translation scheduler.
///
/// It owns engine instances, batching, retries and timeouts; the core only
/// tells it which engines exist and asks it to translate.
#[async_trait]
pub trait TranslateScheduler: Send + Sync {
    async fn translate(
        &self,
        translator: &TranslatorId,
        request: &TranslateRequest,
    ) -> Result<String, SchedulerError>;

    /// Replace the set of engines the scheduler may use.
    fn set_translators(&self, translators: TranslatorSet);
}
