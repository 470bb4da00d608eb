//! Request handlers, one type per request name.

mod config;
mod dictionary;
mod history;
mod ping;
mod preferences;
mod recent;
mod text_translator;
mod translate;
mod translators;
mod tts;

use linguist_protocol::requests;

use crate::error::RouterResult;
use crate::router::Router;
use crate::services::Services;

pub use ping::Ping;

/// Register every handler, readiness last, and seal the router.
pub fn register_all(router: &mut Router<Services>) -> RouterResult<()> {
    router
        .register::<translate::Translate>()?
        .register::<translate::GetAvailableTranslators>()?
        .register::<translate::ClearCache>()?
        .register::<tts::AddTts>()?
        .register::<tts::UpdateTts>()?
        .register::<tts::DeleteTts>()?
        .register::<tts::GetTtsList>()?
        .register::<history::AddHistoryEntry>()?
        .register::<history::GetHistoryEntries>()?
        .register::<history::DeleteHistoryEntry>()?
        .register::<history::ClearHistory>()?
        .register::<config::GetConfig>()?
        .register::<config::SetConfig>()?
        .register::<config::ResetConfig>()?
        .register::<config::UpdateConfig>()?
        .register::<preferences::GetLanguagePreferences>()?
        .register::<preferences::AddLanguagePreferences>()?
        .register::<preferences::DeleteLanguagePreferences>()?
        .register::<preferences::SetSitePreferences>()?
        .register::<preferences::GetSitePreferences>()?
        .register::<preferences::DeleteSitePreferences>()?
        .register::<dictionary::AddTranslation>()?
        .register::<dictionary::DeleteTranslation>()?
        .register::<dictionary::FindTranslation>()?
        .register::<dictionary::GetTranslations>()?
        .register::<dictionary::ClearTranslations>()?
        .register::<translators::AddTranslator>()?
        .register::<translators::DeleteTranslator>()?
        .register::<translators::UpdateTranslator>()?
        .register::<translators::GetTranslators>()?
        .register::<translators::ApplyTranslators>()?
        .register::<recent::GetRecentUsedLanguages>()?
        .register::<recent::AddRecentUsedLanguage>()?
        .register::<text_translator::GetTextTranslatorState>()?
        .register::<text_translator::SetTextTranslatorState>()?
        .register::<Ping>()?;
    router.seal(requests::READINESS)
}
