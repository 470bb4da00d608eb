use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use linguist_protocol::requests;
use linguist_store::{Record, RecordId};
use linguist_translators::CustomTts;

use crate::error::HandlerResult;
use crate::router::RequestHandler;
use crate::services::Services;

pub struct AddTts;

#[async_trait]
impl RequestHandler<Services> for AddTts {
    const NAME: &'static str = requests::ADD_TTS;
    type Payload = CustomTts;
    type Output = RecordId;

    fn validate(module: &CustomTts) -> Result<(), String> {
        if module.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        Ok(())
    }

    async fn handle(ctx: Arc<Services>, module: CustomTts) -> HandlerResult<RecordId> {
        Ok(ctx.tts.add(module).await?)
    }
}

#[derive(Deserialize)]
pub struct UpdateTtsPayload {
    id: RecordId,
    tts: CustomTts,
}

pub struct UpdateTts;

#[async_trait]
impl RequestHandler<Services> for UpdateTts {
    const NAME: &'static str = requests::UPDATE_TTS;
    type Payload = UpdateTtsPayload;
    type Output = ();

    async fn handle(ctx: Arc<Services>, payload: UpdateTtsPayload) -> HandlerResult<()> {
        Ok(ctx.tts.update(payload.id, payload.tts).await?)
    }
}

pub struct DeleteTts;

#[async_trait]
impl RequestHandler<Services> for DeleteTts {
    const NAME: &'static str = requests::DELETE_TTS;
    type Payload = RecordId;
    type Output = ();

    async fn handle(ctx: Arc<Services>, id: RecordId) -> HandlerResult<()> {
        Ok(ctx.tts.delete(id).await?)
    }
}

pub struct GetTtsList;

#[async_trait]
impl RequestHandler<Services> for GetTtsList {
    const NAME: &'static str = requests::GET_TTS_LIST;
    type Payload = ();
    type Output = Vec<Record<CustomTts>>;

    async fn handle(ctx: Arc<Services>, _payload: ()) -> HandlerResult<Self::Output> {
        Ok(ctx.tts.list().await?)
    }
}
