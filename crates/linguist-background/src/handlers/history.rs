use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use linguist_protocol::requests;
use linguist_store::{Record, RecordId};

use crate::error::HandlerResult;
use crate::router::RequestHandler;
use crate::services::{Services, MAX_HISTORY_ENTRIES};
use crate::state::{HistoryEntry, TranslationRecord};

#[derive(Deserialize)]
pub struct HistoryEntryPayload {
    translation: TranslationRecord,
    #[serde(default)]
    origin: Option<String>,
}

/// Record a translation in history. Returns `null` when history is disabled.
pub struct AddHistoryEntry;

#[async_trait]
impl RequestHandler<Services> for AddHistoryEntry {
    const NAME: &'static str = requests::ADD_HISTORY_ENTRY;
    type Payload = HistoryEntryPayload;
    type Output = Option<RecordId>;

    async fn handle(ctx: Arc<Services>, payload: HistoryEntryPayload) -> HandlerResult<Option<RecordId>> {
        if !ctx.config.get_config().await?.history.enabled {
            debug!("history disabled, entry not recorded");
            return Ok(None);
        }
        let id = ctx
            .history
            .add(HistoryEntry {
                translation: payload.translation,
                origin: payload.origin,
                timestamp: Utc::now(),
            })
            .await?;
        ctx.history.truncate_oldest(MAX_HISTORY_ENTRIES).await?;
        Ok(Some(id))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HistoryQuery {
    limit: Option<usize>,
    /// Case-insensitive substring of the original or translated text.
    search: Option<String>,
}

/// History entries, newest first.
pub struct GetHistoryEntries;

#[async_trait]
impl RequestHandler<Services> for GetHistoryEntries {
    const NAME: &'static str = requests::GET_HISTORY_ENTRIES;
    type Payload = Option<HistoryQuery>;
    type Output = Vec<Record<HistoryEntry>>;

    async fn handle(ctx: Arc<Services>, query: Option<HistoryQuery>) -> HandlerResult<Self::Output> {
        let query = query.unwrap_or_default();
        let needle = query.search.map(|s| s.to_lowercase());
        let mut entries = ctx
            .history
            .find(|entry| match &needle {
                Some(needle) => {
                    let t = &entry.translation;
                    t.original_text.to_lowercase().contains(needle)
                        || t.translated_text.to_lowercase().contains(needle)
                }
                None => true,
            })
            .await?;
        entries.reverse();
        if let Some(limit) = query.limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }
}

pub struct DeleteHistoryEntry;

#[async_trait]
impl RequestHandler<Services> for DeleteHistoryEntry {
    const NAME: &'static str = requests::DELETE_HISTORY_ENTRY;
    type Payload = RecordId;
    type Output = bool;

    async fn handle(ctx: Arc<Services>, id: RecordId) -> HandlerResult<bool> {
        Ok(ctx.history.delete(id).await?)
    }
}

pub struct ClearHistory;

#[async_trait]
impl RequestHandler<Services> for ClearHistory {
    const NAME: &'static str = requests::CLEAR_HISTORY;
    type Payload = ();
    type Output = ();

    async fn handle(ctx: Arc<Services>, _payload: ()) -> HandlerResult<()> {
        Ok(ctx.history.clear().await?)
    }
}
