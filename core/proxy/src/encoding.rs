//! Binary-safe payload encoding.
//!
//! JSON cannot carry raw bytes, so every binary payload crossing the proxy
//! wire travels as an [`EncodedBlob`]: standard-alphabet, padded base64 plus
//! advisory content type. `decode_base64(&encode_base64(b)) == b` for every
//! byte sequence `b`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use openhub_common::{Error, Result};

/// Encode bytes with the standard padded alphabet.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode text produced by [`encode_base64`].
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|e| Error::Encoding(format!("Invalid base64 payload: {}", e)))
}

/// Wire form of a binary payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedBlob {
    pub base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl EncodedBlob {
    pub fn from_bytes(bytes: &[u8], content_type: Option<String>) -> Self {
        Self {
            base64: encode_base64(bytes),
            content_type,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        decode_base64(&self.base64)
    }

    /// Check whether a JSON value has the shape of an encoded blob.
    pub fn is_encoded(value: &Value) -> bool {
        value.get("base64").is_some_and(Value::is_string)
    }
}

/// Payload of a blob `put` as received by a proxy handler.
///
/// HTTP transports always send `Encoded`; `Raw` covers transports that
/// hand values over without encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum BlobPayload {
    Encoded(EncodedBlob),
    Raw(Value),
}

impl BlobPayload {
    /// Classify a JSON argument.
    pub fn from_value(value: Value) -> Self {
        if EncodedBlob::is_encoded(&value) {
            if let Ok(encoded) = serde_json::from_value::<EncodedBlob>(value.clone()) {
                return BlobPayload::Encoded(encoded);
            }
        }
        BlobPayload::Raw(value)
    }

    pub fn to_value(&self) -> Value {
        match self {
            BlobPayload::Encoded(encoded) => serde_json::to_value(encoded).unwrap_or(Value::Null),
            BlobPayload::Raw(value) => value.clone(),
        }
    }

    /// Recover the bytes and any content type carried with them.
    ///
    /// Raw strings are taken as UTF-8 text and raw arrays as byte lists;
    /// any other raw value is rejected.
    pub fn into_bytes(self) -> Result<(Vec<u8>, Option<String>)> {
        match self {
            BlobPayload::Encoded(encoded) => {
                let bytes = encoded.to_bytes()?;
                Ok((bytes, encoded.content_type))
            }
            BlobPayload::Raw(Value::String(text)) => Ok((text.into_bytes(), None)),
            BlobPayload::Raw(Value::Array(items)) => {
                let bytes = items
                    .iter()
                    .map(|item| {
                        item.as_u64()
                            .and_then(|n| u8::try_from(n).ok())
                            .ok_or_else(|| {
                                Error::InvalidInput(format!("Invalid byte in blob payload: {}", item))
                            })
                    })
                    .collect::<Result<Vec<u8>>>()?;
                Ok((bytes, None))
            }
            BlobPayload::Raw(other) => Err(Error::InvalidInput(format!(
                "Unsupported blob payload: {}",
                other
            ))),
        }
    }
}
