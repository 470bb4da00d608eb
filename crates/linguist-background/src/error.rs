use thiserror::Error;

use linguist_config::ConfigError;
use linguist_protocol::ErrorKind;
use linguist_store::StoreError;
use linguist_translators::TranslatorError;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("handler already registered: {0}")]
    DuplicateName(&'static str),

    #[error("registration is closed, cannot register {0}")]
    RegistrationClosed(&'static str),

    #[error("readiness handler {expected} must be registered last (last was {found:?})")]
    ReadinessNotLast {
        expected: &'static str,
        found: Option<&'static str>,
    },
}

pub type RouterResult<T> = Result<T, RouterError>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("background already started")]
    AlreadyStarted,

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("translators error: {0}")]
    Translators(#[from] TranslatorError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("router error: {0}")]
    Router(#[from] RouterError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Failure reported by a request handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Failed`].
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// The error kind reported on the wire.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Failed(_) => ErrorKind::HandlerFailure,
            Self::Storage(_) => ErrorKind::StorageError,
        }
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RecordNotFound { .. } => Self::Failed(err.to_string()),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<ConfigError> for HandlerError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Store(inner) => inner.into(),
            other => Self::Failed(other.to_string()),
        }
    }
}

impl From<TranslatorError> for HandlerError {
    fn from(err: TranslatorError) -> Self {
        match err {
            TranslatorError::Store(inner) => inner.into(),
            TranslatorError::Config(inner) => inner.into(),
            other => Self::Failed(other.to_string()),
        }
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;

/// Failure seen by an in-process caller of the background.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("{kind}: {message}")]
    Rejected { kind: ErrorKind, message: String },

    #[error("cannot encode payload: {0}")]
    Encode(String),

    #[error("cannot decode result: {0}")]
    Decode(String),

    #[error("response does not belong to the request")]
    CorrelationMismatch,
}

impl RequestError {
    /// Error kind reported by the background, if it answered.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Rejected { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_failures_keep_their_kind() {
        let err: HandlerError = ConfigError::Store(StoreError::Unavailable("disk".into())).into();
        assert_eq!(err.kind(), ErrorKind::StorageError);

        let err: HandlerError = TranslatorError::NotFound(3).into();
        assert_eq!(err.kind(), ErrorKind::HandlerFailure);
        assert_eq!(err.to_string(), "custom translator 3 not found");
    }
}
