use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use linguist_protocol::requests;
use linguist_store::{Record, RecordId};
use linguist_translators::CustomTranslator;

use crate::error::HandlerResult;
use crate::router::RequestHandler;
use crate::services::Services;

fn check(definition: &CustomTranslator) -> Result<(), String> {
    definition.validate().map_err(|e| e.to_string())
}

/// Store a custom translator. Returns its numeric id.
pub struct AddTranslator;

#[async_trait]
impl RequestHandler<Services> for AddTranslator {
    const NAME: &'static str = requests::ADD_TRANSLATOR;
    type Payload = CustomTranslator;
    type Output = RecordId;

    fn validate(definition: &CustomTranslator) -> Result<(), String> {
        check(definition)
    }

    async fn handle(ctx: Arc<Services>, definition: CustomTranslator) -> HandlerResult<RecordId> {
        Ok(ctx.translators.add_translator(definition).await?)
    }
}

#[derive(Deserialize)]
pub struct UpdateTranslatorPayload {
    id: RecordId,
    translator: CustomTranslator,
}

pub struct UpdateTranslator;

#[async_trait]
impl RequestHandler<Services> for UpdateTranslator {
    const NAME: &'static str = requests::UPDATE_TRANSLATOR;
    type Payload = UpdateTranslatorPayload;
    type Output = ();

    fn validate(payload: &UpdateTranslatorPayload) -> Result<(), String> {
        check(&payload.translator)
    }

    async fn handle(ctx: Arc<Services>, payload: UpdateTranslatorPayload) -> HandlerResult<()> {
        Ok(ctx
            .translators
            .update_translator(payload.id, payload.translator)
            .await?)
    }
}

pub struct DeleteTranslator;

#[async_trait]
impl RequestHandler<Services> for DeleteTranslator {
    const NAME: &'static str = requests::DELETE_TRANSLATOR;
    type Payload = RecordId;
    type Output = ();

    async fn handle(ctx: Arc<Services>, id: RecordId) -> HandlerResult<()> {
        Ok(ctx.translators.delete_translator(id).await?)
    }
}

pub struct GetTranslators;

#[async_trait]
impl RequestHandler<Services> for GetTranslators {
    const NAME: &'static str = requests::GET_TRANSLATORS;
    type Payload = ();
    type Output = Vec<Record<CustomTranslator>>;

    async fn handle(ctx: Arc<Services>, _payload: ()) -> HandlerResult<Self::Output> {
        Ok(ctx.translators.get_translators().await?)
    }
}

pub struct ApplyTranslators;

#[async_trait]
impl RequestHandler<Services> for ApplyTranslators {
    const NAME: &'static str = requests::APPLY_TRANSLATORS;
    type Payload = ();
    type Output = ();

    async fn handle(ctx: Arc<Services>, _payload: ()) -> HandlerResult<()> {
        ctx.translators.apply_translators().await?;
        Ok(())
    }
}
