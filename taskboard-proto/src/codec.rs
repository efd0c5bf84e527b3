//! JSON codec for the Taskboard wire protocol.
//!
//! Intents and facts travel as JSON text frames over the WebSocket
//! transport. Encoding a well-formed message cannot realistically fail, but
//! the error is surfaced rather than swallowed so transport code can log it.

use crate::protocol::{ClientIntent, ServerFact};

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Encodes a [`ClientIntent`] into a JSON string.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the intent cannot be serialized.
pub fn encode_intent(intent: &ClientIntent) -> Result<String, CodecError> {
    serde_json::to_string(intent).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a [`ClientIntent`] from a JSON string.
///
/// Unknown event names and payloads missing required fields are decode
/// errors; the caller decides how to report them.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the text is not a valid intent.
pub fn decode_intent(text: &str) -> Result<ClientIntent, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Encodes a [`ServerFact`] into a JSON string.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the fact cannot be serialized.
pub fn encode_fact(fact: &ServerFact) -> Result<String, CodecError> {
    serde_json::to_string(fact).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a [`ServerFact`] from a JSON string.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the text is not a valid fact.
pub fn decode_fact(text: &str) -> Result<ServerFact, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::Serialization(e.to_string()))
}
