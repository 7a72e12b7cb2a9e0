// Copyright (c) 2025 - Cowboy AI, Inc.
//! Wire encoding for socket messages

use crate::errors::{ConduitError, ConduitResult};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes and decodes messages of type `M` to and from raw frames
pub trait MessageCodec<M>: Send + Sync {
    /// Encode `message` into a frame
    fn encode(&self, message: &M) -> ConduitResult<Bytes>;

    /// Decode a frame, failing with [`ConduitError::PayloadDecode`]
    fn decode(&self, frame: &[u8]) -> ConduitResult<M>;
}

/// JSON frames via serde
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<M> MessageCodec<M> for JsonCodec
where
    M: Serialize + DeserializeOwned,
{
    fn encode(&self, message: &M) -> ConduitResult<Bytes> {
        serde_json::to_vec(message)
            .map(Bytes::from)
            .map_err(|e| ConduitError::Serialization(e.to_string()))
    }

    fn decode(&self, frame: &[u8]) -> ConduitResult<M> {
        Ok(serde_json::from_slice(frame)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{ChatMessage, ChatMessages, User};

    #[test]
    fn test_json_codec_user() {
        let user = User {
            user_id: 111,
            username: "relay".to_string(),
        };
        let frame = MessageCodec::<User>::encode(&JsonCodec, &user).unwrap();
        assert_eq!(&frame[..], br#"{"user_id":111,"username":"relay"}"#);
    }

    #[test]
    fn test_json_codec_rejects_other_shape() {
        let frame = br#"{"message":"hi","user_id":1}"#;
        let batch: ConduitResult<ChatMessages> = JsonCodec.decode(frame);
        assert!(matches!(batch, Err(ConduitError::PayloadDecode(_))));

        let single: ChatMessage = JsonCodec.decode(frame).unwrap();
        assert_eq!(single.user_id, 1);
    }
}
