use std::sync::Arc;

use async_trait::async_trait;

use linguist_protocol::requests;

use crate::error::HandlerResult;
use crate::router::RequestHandler;
use crate::services::Services;

/// Readiness check. Registered last, so an answer means every handler is live.
pub struct Ping;

#[async_trait]
impl RequestHandler<Services> for Ping {
    const NAME: &'static str = requests::PING;
    type Payload = ();
    type Output = &'static str;

    async fn handle(_ctx: Arc<Services>, _payload: ()) -> HandlerResult<&'static str> {
        Ok("pong")
    }
}
