use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use linguist_protocol::requests;
use linguist_translators::{TranslateRequest, TranslatorId};

use crate::error::HandlerResult;
use crate::router::RequestHandler;
use crate::services::Services;

pub struct Translate;

#[async_trait]
impl RequestHandler<Services> for Translate {
    const NAME: &'static str = requests::TRANSLATE;
    type Payload = TranslateRequest;
    type Output = String;

    fn validate(payload: &TranslateRequest) -> Result<(), String> {
        if payload.from.trim().is_empty() || payload.to.trim().is_empty() {
            return Err("source and target languages are required".into());
        }
        Ok(())
    }

    async fn handle(ctx: Arc<Services>, request: TranslateRequest) -> HandlerResult<String> {
        Ok(ctx.translation.translate(request).await?)
    }
}

/// Translator id to display name, builtin and custom.
pub struct GetAvailableTranslators;

#[async_trait]
impl RequestHandler<Services> for GetAvailableTranslators {
    const NAME: &'static str = requests::GET_AVAILABLE_TRANSLATORS;
    type Payload = ();
    type Output = BTreeMap<TranslatorId, String>;

    async fn handle(ctx: Arc<Services>, _payload: ()) -> HandlerResult<Self::Output> {
        let set = ctx.translators.available_translators().await?;
        Ok(set.into_iter().map(|(id, info)| (id, info.name)).collect())
    }
}

/// Clear one translator's cached results, or all of them when the payload is
/// `null`. Returns the number of removed entries.
pub struct ClearCache;

#[async_trait]
impl RequestHandler<Services> for ClearCache {
    const NAME: &'static str = requests::CLEAR_CACHE;
    type Payload = Option<TranslatorId>;
    type Output = usize;

    async fn handle(ctx: Arc<Services>, scope: Option<TranslatorId>) -> HandlerResult<usize> {
        Ok(ctx.cache.clear(scope.as_ref()))
    }
}
