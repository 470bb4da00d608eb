use std::sync::Arc;

use async_trait::async_trait;

use linguist_protocol::requests;

use crate::error::HandlerResult;
use crate::router::RequestHandler;
use crate::services::Services;

pub struct GetRecentUsedLanguages;

#[async_trait]
impl RequestHandler<Services> for GetRecentUsedLanguages {
    const NAME: &'static str = requests::GET_RECENT_USED_LANGUAGES;
    type Payload = ();
    type Output = Vec<String>;

    async fn handle(ctx: Arc<Services>, _payload: ()) -> HandlerResult<Vec<String>> {
        Ok(ctx.recent_languages.list().await?)
    }
}

/// Move a language to the front of the recently used list.
pub struct AddRecentUsedLanguage;

#[async_trait]
impl RequestHandler<Services> for AddRecentUsedLanguage {
    const NAME: &'static str = requests::ADD_RECENT_USED_LANGUAGE;
    type Payload = String;
    type Output = Vec<String>;

    fn validate(language: &String) -> Result<(), String> {
        if language.trim().is_empty() {
            return Err("language must not be empty".into());
        }
        Ok(())
    }

    async fn handle(ctx: Arc<Services>, language: String) -> HandlerResult<Vec<String>> {
        Ok(ctx.recent_languages.add(language).await?)
    }
}
