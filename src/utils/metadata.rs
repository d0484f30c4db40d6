// src/utils/metadata.rs
//! Verification and document metadata codec.
//!
//! Verifiers attach metadata as an ABI-encoded `string` holding a small JSON object
//! `{"details": ..., "timestamp": ...}`. Some writers wrapped an already encoded
//! payload into `details` again, so a record can carry several layers. Decoding
//! peels layers until it reaches plain text, and gives up after
//! [`MAX_DECODE_DEPTH`] layers, returning the best value seen so far.

use chrono::{DateTime, SecondsFormat, Utc};
use ethers_core::abi::{self, ParamType, Token};
use ethers_core::types::Bytes;
use ethers_core::utils::hex;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Upper bound on the number of nested layers unwrapped by [`decode`].
pub const MAX_DECODE_DEPTH: usize = 8;

/// Plain-text view of a metadata payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedMetadata {
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Decodes a metadata string, never failing.
///
/// Input that is not `0x`-prefixed is treated as already decoded text, so a plain
/// string comes back unchanged. When a layer cannot be decoded the last plain
/// value is returned.
pub fn decode(raw: &str) -> DecodedMetadata {
    let mut current = raw.to_string();
    let mut fallback = raw.to_string();
    let mut timestamp: Option<String> = None;

    for depth in 0..MAX_DECODE_DEPTH {
        let text = match decode_abi_string(&current) {
            Some(text) => text,
            None if depth == 0 && !looks_encoded(&current) => current.clone(),
            None => return finish(fallback, timestamp),
        };

        let object = match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(object)) => object,
            _ => return finish(text, timestamp),
        };

        if timestamp.is_none() {
            timestamp = object
                .get("timestamp")
                .and_then(Value::as_str)
                .map(str::to_string);
        }

        match object.get("details") {
            Some(Value::String(inner)) if looks_encoded(inner) => {
                fallback = inner.clone();
                current = inner.clone();
            }
            Some(Value::String(inner)) => return finish(inner.clone(), timestamp),
            Some(Value::Null) | None => return finish(String::new(), timestamp),
            Some(other) => return finish(other.to_string(), timestamp),
        }
    }

    debug!("metadata nesting exceeded {} layers, returning last payload", MAX_DECODE_DEPTH);
    finish(fallback, timestamp)
}

/// Decodes raw `bytes` metadata as stored on a verification record.
///
/// Bytes that are not an ABI string but are valid UTF-8 are decoded as text.
pub fn decode_bytes(raw: &Bytes) -> DecodedMetadata {
    let encoded = format!("0x{}", hex::encode(raw.as_ref()));
    if decode_abi_string(&encoded).is_some() {
        return decode(&encoded);
    }
    match std::str::from_utf8(raw.as_ref()) {
        Ok(text) => decode(text),
        Err(_) => decode(&encoded),
    }
}

/// Encodes `details` with the current time as a single metadata layer.
pub fn encode(details: &str) -> Bytes {
    encode_at(details, Utc::now())
}

/// Encodes `details` with an explicit timestamp.
pub fn encode_at(details: &str, at: DateTime<Utc>) -> Bytes {
    let payload = json!({
        "details": details,
        "timestamp": at.to_rfc3339_opts(SecondsFormat::Millis, true),
    });
    Bytes::from(abi::encode(&[Token::String(payload.to_string())]))
}

fn finish(details: String, timestamp: Option<String>) -> DecodedMetadata {
    DecodedMetadata { details, timestamp }
}

fn looks_encoded(value: &str) -> bool {
    value.starts_with("0x") || value.starts_with("0X")
}

fn decode_abi_string(value: &str) -> Option<String> {
    if !looks_encoded(value) {
        return None;
    }
    let bytes = hex::decode(&value[2..]).ok()?;
    match abi::decode(&[ParamType::String], &bytes).ok()?.pop()? {
        Token::String(text) => Some(text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn wrap(text: &str) -> String {
        format!("0x{}", hex::encode(abi::encode(&[Token::String(text.to_string())])))
    }

    #[test]
    fn test_plain_string_is_returned_unchanged() {
        let decoded = decode("Passport checked in person");
        assert_eq!(decoded.details, "Passport checked in person");
        assert_eq!(decoded.timestamp, None);
    }

    #[test]
    fn test_single_encoded_layer() {
        let raw = wrap(r#"{"details":"hello","timestamp":"2024-01-01T00:00:00Z"}"#);
        let decoded = decode(&raw);
        assert_eq!(decoded.details, "hello");
        assert_eq!(decoded.timestamp.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_nested_layers_keep_outer_timestamp() {
        let inner = wrap(r#"{"details":"KYC documents reviewed","timestamp":"2024-02-02T00:00:00Z"}"#);
        let middle = wrap(&json!({ "details": inner }).to_string());
        let outer = wrap(&json!({ "details": middle, "timestamp": "2024-03-03T00:00:00Z" }).to_string());

        let decoded = decode(&outer);
        assert_eq!(decoded.details, "KYC documents reviewed");
        assert_eq!(decoded.timestamp.as_deref(), Some("2024-03-03T00:00:00Z"));
    }

    #[test]
    fn test_unencoded_json_object() {
        let decoded = decode(r#"{"details":"direct","timestamp":"t"}"#);
        assert_eq!(decoded.details, "direct");
        assert_eq!(decoded.timestamp.as_deref(), Some("t"));
    }

    #[test]
    fn test_object_without_details_has_empty_details() {
        let decoded = decode(r#"{"comment":"Approved"}"#);
        assert_eq!(decoded.details, "");
        assert_eq!(decoded.timestamp, None);

        let decoded = decode(&wrap(r#"{"timestamp":"t"}"#));
        assert_eq!(decoded.details, "");
        assert_eq!(decoded.timestamp.as_deref(), Some("t"));
    }

    #[test]
    fn test_encoded_non_json_text() {
        let decoded = decode(&wrap("just words"));
        assert_eq!(decoded.details, "just words");
    }

    #[test]
    fn test_malformed_hex_falls_back_to_raw() {
        let decoded = decode("0xnot-hex");
        assert_eq!(decoded.details, "0xnot-hex");
    }

    #[test]
    fn test_undecodable_inner_layer_returns_inner_value() {
        let raw = wrap(r#"{"details":"0xdeadbeef","timestamp":"t"}"#);
        let decoded = decode(&raw);
        assert_eq!(decoded.details, "0xdeadbeef");
        assert_eq!(decoded.timestamp.as_deref(), Some("t"));
    }

    #[test]
    fn test_deep_nesting_stops_at_cap() {
        let mut payload = wrap(r#"{"details":"bottom"}"#);
        for _ in 0..(MAX_DECODE_DEPTH + 4) {
            payload = wrap(&json!({ "details": payload }).to_string());
        }

        let decoded = decode(&payload);
        assert!(decoded.details.starts_with("0x"));
        assert_ne!(decoded.details, "bottom");
    }

    #[test]
    fn test_encode_then_decode_bytes() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let bytes = encode_at("Driver license verified", at);
        let decoded = decode_bytes(&bytes);
        assert_eq!(decoded.details, "Driver license verified");
        assert_eq!(decoded.timestamp.as_deref(), Some("2024-05-01T12:00:00.000Z"));
    }

    #[test]
    fn test_decode_bytes_plain_utf8() {
        let decoded = decode_bytes(&Bytes::from(b"notes".to_vec()));
        assert_eq!(decoded.details, "notes");
    }
}
