use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use linguist_protocol::requests;

use crate::error::HandlerResult;
use crate::router::RequestHandler;
use crate::services::Services;
use crate::state::{LanguagePreferences, SitePreferences};

fn non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(())
}

pub struct GetLanguagePreferences;

#[async_trait]
impl RequestHandler<Services> for GetLanguagePreferences {
    const NAME: &'static str = requests::GET_LANGUAGE_PREFERENCES;
    type Payload = String;
    type Output = Option<LanguagePreferences>;

    async fn handle(ctx: Arc<Services>, language: String) -> HandlerResult<Self::Output> {
        Ok(ctx.language_preferences.get(&language).await?)
    }
}

#[derive(Deserialize)]
pub struct LanguagePreferencesPayload {
    language: String,
    preferences: LanguagePreferences,
}

pub struct AddLanguagePreferences;

#[async_trait]
impl RequestHandler<Services> for AddLanguagePreferences {
    const NAME: &'static str = requests::ADD_LANGUAGE_PREFERENCES;
    type Payload = LanguagePreferencesPayload;
    type Output = ();

    fn validate(payload: &LanguagePreferencesPayload) -> Result<(), String> {
        non_empty("language", &payload.language)
    }

    async fn handle(ctx: Arc<Services>, payload: LanguagePreferencesPayload) -> HandlerResult<()> {
        Ok(ctx
            .language_preferences
            .set(payload.language, payload.preferences)
            .await?)
    }
}

pub struct DeleteLanguagePreferences;

#[async_trait]
impl RequestHandler<Services> for DeleteLanguagePreferences {
    const NAME: &'static str = requests::DELETE_LANGUAGE_PREFERENCES;
    type Payload = String;
    type Output = bool;

    async fn handle(ctx: Arc<Services>, language: String) -> HandlerResult<bool> {
        Ok(ctx.language_preferences.delete(&language).await?)
    }
}

#[derive(Deserialize)]
pub struct SitePreferencesPayload {
    site: String,
    preferences: SitePreferences,
}

pub struct SetSitePreferences;

#[async_trait]
impl RequestHandler<Services> for SetSitePreferences {
    const NAME: &'static str = requests::SET_SITE_PREFERENCES;
    type Payload = SitePreferencesPayload;
    type Output = ();

    fn validate(payload: &SitePreferencesPayload) -> Result<(), String> {
        non_empty("site", &payload.site)
    }

    async fn handle(ctx: Arc<Services>, payload: SitePreferencesPayload) -> HandlerResult<()> {
        Ok(ctx.site_preferences.set(payload.site, payload.preferences).await?)
    }
}

pub struct GetSitePreferences;

#[async_trait]
impl RequestHandler<Services> for GetSitePreferences {
    const NAME: &'static str = requests::GET_SITE_PREFERENCES;
    type Payload = String;
    type Output = Option<SitePreferences>;

    async fn handle(ctx: Arc<Services>, site: String) -> HandlerResult<Self::Output> {
        Ok(ctx.site_preferences.get(&site).await?)
    }
}

pub struct DeleteSitePreferences;

#[async_trait]
impl RequestHandler<Services> for DeleteSitePreferences {
    const NAME: &'static str = requests::DELETE_SITE_PREFERENCES;
    type Payload = String;
    type Output = bool;

    async fn handle(ctx: Arc<Services>, site: String) -> HandlerResult<bool> {
        Ok(ctx.site_preferences.delete(&site).await?)
    }
}
