use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use linguist_protocol::requests;
use linguist_store::{Record, RecordId};

use crate::error::HandlerResult;
use crate::router::RequestHandler;
use crate::services::Services;
use crate::state::{DictionaryEntry, TranslationRecord};

/// Save a translation to the dictionary. Returns its id.
pub struct AddTranslation;

#[async_trait]
impl RequestHandler<Services> for AddTranslation {
    const NAME: &'static str = requests::ADD_TRANSLATION;
    type Payload = TranslationRecord;
    type Output = RecordId;

    fn validate(record: &TranslationRecord) -> Result<(), String> {
        if record.original_text.is_empty() {
            return Err("originalText must not be empty".into());
        }
        Ok(())
    }

    async fn handle(ctx: Arc<Services>, translation: TranslationRecord) -> HandlerResult<RecordId> {
        let entry = DictionaryEntry {
            translation,
            date: Utc::now(),
        };
        Ok(ctx.dictionary.add(entry).await?)
    }
}

pub struct DeleteTranslation;

#[async_trait]
impl RequestHandler<Services> for DeleteTranslation {
    const NAME: &'static str = requests::DELETE_TRANSLATION;
    type Payload = RecordId;
    type Output = bool;

    async fn handle(ctx: Arc<Services>, id: RecordId) -> HandlerResult<bool> {
        Ok(ctx.dictionary.delete(id).await?)
    }
}

/// Fields to match; absent fields match anything.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranslationQuery {
    from: Option<String>,
    to: Option<String>,
    original_text: Option<String>,
    translated_text: Option<String>,
}

impl TranslationQuery {
    fn matches(&self, entry: &DictionaryEntry) -> bool {
        let t = &entry.translation;
        let eq = |want: &Option<String>, have: &str| want.as_deref().map_or(true, |w| w == have);
        eq(&self.from, &t.from)
            && eq(&self.to, &t.to)
            && eq(&self.original_text, &t.original_text)
            && eq(&self.translated_text, &t.translated_text)
    }
}

/// First dictionary entry matching the query, if any.
pub struct FindTranslation;

#[async_trait]
impl RequestHandler<Services> for FindTranslation {
    const NAME: &'static str = requests::FIND_TRANSLATION;
    type Payload = TranslationQuery;
    type Output = Option<Record<DictionaryEntry>>;

    async fn handle(ctx: Arc<Services>, query: TranslationQuery) -> HandlerResult<Self::Output> {
        let found = ctx.dictionary.find(|entry| query.matches(entry)).await?;
        Ok(found.into_iter().next())
    }
}

pub struct GetTranslations;

#[async_trait]
impl RequestHandler<Services> for GetTranslations {
    const NAME: &'static str = requests::GET_TRANSLATIONS;
    type Payload = ();
    type Output = Vec<Record<DictionaryEntry>>;

    async fn handle(ctx: Arc<Services>, _payload: ()) -> HandlerResult<Self::Output> {
        Ok(ctx.dictionary.list().await?)
    }
}

pub struct ClearTranslations;

#[async_trait]
impl RequestHandler<Services> for ClearTranslations {
    const NAME: &'static str = requests::CLEAR_TRANSLATIONS;
    type Payload = ();
    type Output = ();

    async fn handle(ctx: Arc<Services>, _payload: ()) -> HandlerResult<()> {
        Ok(ctx.dictionary.clear().await?)
    }
}
