use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ProtocolError;

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Ties a response to its request within one channel session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Fresh time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Id used when a response cannot be tied to a decodable request.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound request from a UI context to the background.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMessage {
    pub correlation_id: CorrelationId,
    pub request_name: String,
    #[serde(default)]
    pub payload: Value,
}

impl RequestMessage {
    /// Request with a fresh correlation id.
    pub fn new(request_name: impl Into<String>, payload: Value) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            request_name: request_name.into(),
            payload,
        }
    }
}

/// Unsolicited notification from the background to every UI context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

impl EventMessage {
    /// Event named `event` carrying `payload`.
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

/// Error categories a caller can observe in a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Payload rejected by the request's validator; the handler never ran.
    InvalidPayload,
    /// No handler is registered under the request name.
    UnknownRequest,
    /// The handler failed or panicked.
    HandlerFailure,
    /// The persistent backend failed while the handler was running.
    StorageError,
}

impl ErrorKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPayload => "InvalidPayload",
            Self::UnknownRequest => "UnknownRequest",
            Self::HandlerFailure => "HandlerFailure",
            Self::StorageError => "StorageError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Ok(Value),
    Err { kind: ErrorKind, message: String },
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Ok(_) => None,
            Self::Err { kind, .. } => Some(*kind),
        }
    }
}

/// Inbound response, flattened on the wire to
/// `{correlationId, ok: true, result}` or `{correlationId, ok: false, errorKind, errorMessage}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireResponse", try_from = "WireResponse")]
pub struct ResponseMessage {
    pub correlation_id: CorrelationId,
    pub outcome: Outcome,
}

impl ResponseMessage {
    /// Successful response to `correlation_id`.
    pub fn ok(correlation_id: CorrelationId, result: Value) -> Self {
        Self {
            correlation_id,
            outcome: Outcome::Ok(result),
        }
    }

    /// Failed response to `correlation_id`.
    pub fn error(correlation_id: CorrelationId, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            correlation_id,
            outcome: Outcome::Err {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.outcome.error_kind()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    correlation_id: CorrelationId,
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl From<ResponseMessage> for WireResponse {
    fn from(msg: ResponseMessage) -> Self {
        match msg.outcome {
            Outcome::Ok(result) => Self {
                correlation_id: msg.correlation_id,
                ok: true,
                result: Some(result),
                error_kind: None,
                error_message: None,
            },
            Outcome::Err { kind, message } => Self {
                correlation_id: msg.correlation_id,
                ok: false,
                result: None,
                error_kind: Some(kind),
                error_message: Some(message),
            },
        }
    }
}

impl TryFrom<WireResponse> for ResponseMessage {
    type Error = ProtocolError;

    fn try_from(wire: WireResponse) -> Result<Self, Self::Error> {
        let outcome = if wire.ok {
            // `null` results deserialize as `None` through `Option<Value>`.
            Outcome::Ok(wire.result.unwrap_or(Value::Null))
        } else {
            let kind = wire
                .error_kind
                .ok_or_else(|| ProtocolError::MalformedResponse("missing errorKind".into()))?;
            Outcome::Err {
                kind,
                message: wire.error_message.unwrap_or_default(),
            }
        };
        Ok(Self {
            correlation_id: wire.correlation_id,
            outcome,
        })
    }
}
