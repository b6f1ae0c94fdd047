//! Payload codec: base64-encoded JSON documents carried by lobby frames.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::DecodeError;

/// Standard alphabet, `=` padding optional on decode.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a transport-encoded payload into a generic JSON value.
///
/// Surrounding whitespace is ignored and trailing `=` padding may be
/// omitted. The two stages fail independently:
/// a bad base64 string yields [`DecodeError::Base64`], a bad document yields
/// [`DecodeError::Json`]. Both keep the encoded input for diagnostics.
///
/// # Errors
///
/// See above. Callers are expected to log the error and skip the event.
pub fn decode_payload(encoded: &str) -> Result<serde_json::Value, DecodeError> {
    let bytes = LENIENT
        .decode(encoded.trim())
        .map_err(|source| DecodeError::Base64 {
            source,
            raw: encoded.to_string(),
        })?;

    serde_json::from_slice(&bytes).map_err(|source| DecodeError::Json {
        source,
        raw: encoded.to_string(),
    })
}

/// Encode a JSON value the way the lobby service does. Used by tests and tools
/// that need to produce frames.
pub fn encode_payload(value: &serde_json::Value) -> String {
    STANDARD.encode(value.to_string())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_base64_json() {
        // {"SessionID":"S1"}
        let value = decode_payload("eyJTZXNzaW9uSUQiOiJTMSJ9").unwrap();
        assert_eq!(value, json!({"SessionID": "S1"}));
    }

    #[test]
    fn trims_whitespace() {
        let value = decode_payload("  e30=\n").unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn encode_then_decode_preserves_value() {
        let original = json!({"SessionID": "S1", "Members": [{"ID": "U1", "StatusV2": "JOINED"}]});
        assert_eq!(decode_payload(&encode_payload(&original)).unwrap(), original);
    }

    #[test]
    fn padding_is_optional() {
        assert_eq!(decode_payload("e30").unwrap(), json!({}));
        // {"ID":"U1"} without its trailing "="
        assert_eq!(
            decode_payload("eyJJRCI6IlUxIn0").unwrap(),
            json!({"ID": "U1"})
        );
    }

    #[test]
    fn invalid_base64_is_reported_with_raw_input() {
        let err = decode_payload("not base64!!").unwrap_err();
        assert!(matches!(err, DecodeError::Base64 { .. }));
        assert_eq!(err.raw(), "not base64!!");
    }

    #[test]
    fn invalid_json_is_reported_with_raw_input() {
        let encoded = STANDARD.encode("{\"SessionID\":");
        let err = decode_payload(&encoded).unwrap_err();
        assert!(matches!(err, DecodeError::Json { .. }));
        assert_eq!(err.raw(), encoded);
    }

    #[test]
    fn non_utf8_bytes_are_a_json_error() {
        let encoded = STANDARD.encode([0xff, 0xfe, 0x00]);
        assert!(matches!(
            decode_payload(&encoded),
            Err(DecodeError::Json { .. })
        ));
    }
}
