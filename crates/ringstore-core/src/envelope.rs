//! CBOR payload envelope carried by Store and Load messages.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;
use crate::message::MAX_PAYLOAD;

/// A key with its value. Load requests carry an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: Bytes,
    pub value: Bytes,
}

impl KeyValue {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// An envelope naming only a key.
    pub fn key_only(key: impl Into<Bytes>) -> Self {
        Self::new(key, Bytes::new())
    }

    /// Encode to CBOR, rejecting envelopes that cannot fit a message.
    pub fn encode(&self) -> Result<Bytes, EnvelopeError> {
        let mut buf = Vec::with_capacity(self.key.len() + self.value.len() + 16);
        ciborium::into_writer(self, &mut buf).map_err(|e| EnvelopeError::Encode(e.to_string()))?;

        if buf.len() > MAX_PAYLOAD {
            return Err(EnvelopeError::TooLarge {
                len: buf.len(),
                max: MAX_PAYLOAD,
            });
        }
        Ok(Bytes::from(buf))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        ciborium::from_reader(bytes).map_err(|e| EnvelopeError::Decode(e.to_string()))
    }
}
