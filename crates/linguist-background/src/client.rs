use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use linguist_config::{AppConfig, UpdateOutcome};
use linguist_protocol::{requests, Outcome, RequestMessage};
use linguist_translators::TranslateRequest;

use crate::error::RequestError;
use crate::lifecycle::Background;

/// Typed in-process caller of a [`Background`].
#[derive(Clone)]
pub struct BackgroundClient {
    background: Arc<Background>,
}

impl BackgroundClient {
    /// Client over a started or starting background.
    pub fn new(background: Arc<Background>) -> Self {
        Self { background }
    }

    /// Send `payload` as request `name` and decode the result as `R`.
    pub async fn call<P, R>(&self, name: &str, payload: &P) -> Result<R, RequestError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_value(payload).map_err(|e| RequestError::Encode(e.to_string()))?;
        let request = RequestMessage::new(name, payload);
        let correlation_id = request.correlation_id;

        let response = self.background.dispatch(request).await;
        if response.correlation_id != correlation_id {
            return Err(RequestError::CorrelationMismatch);
        }
        match response.outcome {
            Outcome::Ok(result) => {
                serde_json::from_value(result).map_err(|e| RequestError::Decode(e.to_string()))
            }
            Outcome::Err { kind, message } => Err(RequestError::Rejected { kind, message }),
        }
    }

    /// Readiness check; answers `"pong"` once handlers are registered.
    pub async fn ping(&self) -> Result<String, RequestError> {
        self.call(requests::PING, &Value::Null).await
    }

    /// Translate through the configured translator.
    pub async fn translate(&self, request: &TranslateRequest) -> Result<String, RequestError> {
        self.call(requests::TRANSLATE, request).await
    }

    pub async fn get_config(&self) -> Result<AppConfig, RequestError> {
        self.call(requests::GET_CONFIG, &Value::Null).await
    }

    /// Apply dotted-path changes all-or-nothing.
    pub async fn update_config(&self, changes: &BTreeMap<String, Value>) -> Result<UpdateOutcome, RequestError> {
        self.call(requests::UPDATE_CONFIG, changes).await
    }
}
