use std::sync::Arc;

use async_trait::async_trait;

use linguist_protocol::requests;

use crate::error::HandlerResult;
use crate::router::RequestHandler;
use crate::services::Services;
use crate::state::TextTranslatorState;

pub struct GetTextTranslatorState;

#[async_trait]
impl RequestHandler<Services> for GetTextTranslatorState {
    const NAME: &'static str = requests::GET_TEXT_TRANSLATOR_STATE;
    type Payload = ();
    type Output = Option<TextTranslatorState>;

    async fn handle(ctx: Arc<Services>, _payload: ()) -> HandlerResult<Self::Output> {
        Ok(ctx.text_translator.get().await?)
    }
}

/// Save the popup translator state. With `rememberText` off only the
/// language pair is kept.
pub struct SetTextTranslatorState;

#[async_trait]
impl RequestHandler<Services> for SetTextTranslatorState {
    const NAME: &'static str = requests::SET_TEXT_TRANSLATOR_STATE;
    type Payload = TextTranslatorState;
    type Output = ();

    async fn handle(ctx: Arc<Services>, mut state: TextTranslatorState) -> HandlerResult<()> {
        if !ctx.config.get_config().await?.text_translator.remember_text {
            state.text.clear();
            state.translation = None;
        }
        Ok(ctx.text_translator.set(state).await?)
    }
}
