//! Request body construction

use crate::providers::error::{ClientError, ClientResult};
use serde::Serialize;

/// Content type of JSON bodies
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// What to send as the request body
#[derive(Debug)]
pub enum Payload<'a, T: ?Sized> {
    /// No body
    Empty,
    /// Bytes sent as is, without a content type of their own
    Raw(&'a [u8]),
    /// A value serialized to JSON
    Json(&'a T),
}

/// Serialized body and the content type it calls for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedBody {
    pub bytes: Option<Vec<u8>>,
    pub content_type: Option<&'static str>,
}

/// Turn a payload into body bytes
///
/// Fails with [`ClientError::Encode`] when the value cannot be represented as
/// JSON (for example a map with non-string keys).
pub fn build_request_body<T>(payload: &Payload<'_, T>) -> ClientResult<EncodedBody>
where
    T: Serialize + ?Sized,
{
    match payload {
        Payload::Empty => Ok(EncodedBody::default()),
        Payload::Raw(bytes) => Ok(EncodedBody {
            bytes: Some(bytes.to_vec()),
            content_type: None,
        }),
        Payload::Json(value) => {
            let bytes = serde_json::to_vec(value).map_err(ClientError::Encode)?;
            Ok(EncodedBody {
                bytes: Some(bytes),
                content_type: Some(CONTENT_TYPE_JSON),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    #[test]
    fn test_empty_payload_has_no_body() {
        let body = build_request_body::<Value>(&Payload::Empty).unwrap();
        assert_eq!(body, EncodedBody::default());
    }

    #[test]
    fn test_raw_payload_passes_through() {
        let raw = b"\x00\x01not json".to_vec();
        let body = build_request_body::<Value>(&Payload::Raw(&raw)).unwrap();
        assert_eq!(body.bytes.as_deref(), Some(raw.as_slice()));
        assert_eq!(body.content_type, None);
    }

    #[test]
    fn test_json_payload_round_trips() {
        let value = json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "hi"}],
            "temperature": 0.5,
            "stream": false
        });
        let body = build_request_body(&Payload::Json(&value)).unwrap();
        assert_eq!(body.content_type, Some(CONTENT_TYPE_JSON));

        let decoded: Value = serde_json::from_slice(&body.bytes.unwrap()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_unserializable_payload_is_encode_error() {
        let mut map: HashMap<Vec<u8>, u32> = HashMap::new();
        map.insert(vec![1, 2], 3);

        let result = build_request_body(&Payload::Json(&map));
        assert!(matches!(result, Err(ClientError::Encode(_))));
    }
}
