//! Message protocol between Linguist execution contexts.
//!
//! Every UI context (popup, options page, content scripts) talks to the
//! background process through request/response pairs correlated by id. This
//! crate defines the envelopes, the error taxonomy visible on the wire, the
//! request-name vocabulary, and a JSON-lines codec for stream transports.

pub mod codec;
pub mod error;
pub mod message;
pub mod requests;

pub use codec::MessageCodec;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    CorrelationId, ErrorKind, EventMessage, Outcome, RequestMessage, ResponseMessage, MAX_MESSAGE_SIZE,
    PROTOCOL_VERSION,
};
