use thiserror::Error;

use crate::scheduler::SchedulerError;

#[derive(Debug, Error)]
pub enum TranslatorError {
    #[error("config error: {0}")]
    Config(#[from] linguist_config::ConfigError),

    #[error("store error: {0}")]
    Store(#[from] linguist_store::StoreError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("custom translator {0} not found")]
    NotFound(u64),

    #[error("invalid definition: {0}")]
    InvalidDefinition(String),
}

pub type TranslatorResult<T> = Result<T, TranslatorError>;
