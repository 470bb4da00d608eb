use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use linguist_config::{AppConfig, UpdateOutcome};
use linguist_protocol::requests;

use crate::error::HandlerResult;
use crate::router::RequestHandler;
use crate::services::Services;

pub struct GetConfig;

#[async_trait]
impl RequestHandler<Services> for GetConfig {
    const NAME: &'static str = requests::GET_CONFIG;
    type Payload = ();
    type Output = AppConfig;

    async fn handle(ctx: Arc<Services>, _payload: ()) -> HandlerResult<AppConfig> {
        Ok(ctx.config.get_config().await?)
    }
}

/// Replace the whole configuration (settings import).
pub struct SetConfig;

#[async_trait]
impl RequestHandler<Services> for SetConfig {
    const NAME: &'static str = requests::SET_CONFIG;
    type Payload = AppConfig;
    type Output = ();

    fn validate(config: &AppConfig) -> Result<(), String> {
        match config.validate().first() {
            Some((path, msg)) => Err(format!("{path}: {msg}")),
            None => Ok(()),
        }
    }

    async fn handle(ctx: Arc<Services>, config: AppConfig) -> HandlerResult<()> {
        Ok(ctx.config.set_config(config).await?)
    }
}

pub struct ResetConfig;

#[async_trait]
impl RequestHandler<Services> for ResetConfig {
    const NAME: &'static str = requests::RESET_CONFIG;
    type Payload = ();
    type Output = ();

    async fn handle(ctx: Arc<Services>, _payload: ()) -> HandlerResult<()> {
        Ok(ctx.config.reset_config().await?)
    }
}

/// Sparse `path -> value` update. Rejected paths are reported in the result,
/// not as an error.
pub struct UpdateConfig;

#[async_trait]
impl RequestHandler<Services> for UpdateConfig {
    const NAME: &'static str = requests::UPDATE_CONFIG;
    type Payload = BTreeMap<String, Value>;
    type Output = UpdateOutcome;

    async fn handle(ctx: Arc<Services>, changes: BTreeMap<String, Value>) -> HandlerResult<UpdateOutcome> {
        Ok(ctx.config.update_config(changes).await?)
    }
}
