//! Header names attached to every outbound delivery.

use http::{HeaderName, HeaderValue};

/// JSON content type header.
pub const CONTENT_TYPE: &str = "Content-Type";
/// Fixed user agent header.
pub const USER_AGENT: &str = "User-Agent";
/// Identifier of the endpoint the delivery belongs to.
pub const WEBHOOK_ID: &str = "X-Webhook-ID";
/// Event type name.
pub const EVENT_TYPE: &str = "X-Event-Type";
/// Event identifier shared by all attempts of one delivery.
pub const EVENT_ID: &str = "X-Event-ID";
/// Envelope timestamp in Unix seconds.
pub const TIMESTAMP: &str = "X-Timestamp";
/// Raw hex HMAC-SHA256 signature.
pub const SIGNATURE: &str = "X-Signature";
/// `sha256=`-prefixed HMAC-SHA256 signature.
pub const SIGNATURE_256: &str = "X-Signature-256";

/// Headers owned by the engine; endpoint custom headers may not set them.
pub const RESERVED: [&str; 8] = [
    CONTENT_TYPE,
    USER_AGENT,
    WEBHOOK_ID,
    EVENT_TYPE,
    EVENT_ID,
    TIMESTAMP,
    SIGNATURE,
    SIGNATURE_256,
];

/// Returns whether `name` collides with an engine-owned header.
pub fn is_reserved(name: &str) -> bool {
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

/// Returns whether `name` is a valid HTTP header field name.
pub fn is_valid_name(name: &str) -> bool {
    HeaderName::from_bytes(name.as_bytes()).is_ok()
}

/// Returns whether `value` is a valid HTTP header field value.
///
/// Opaque bytes above 0x7f are allowed; control characters other than tab
/// are not.
pub fn is_valid_value(value: &str) -> bool {
    HeaderValue::from_bytes(value.as_bytes()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_lookup_ignores_case() {
        assert!(is_reserved("x-signature"));
        assert!(is_reserved("CONTENT-TYPE"));
        assert!(!is_reserved("X-Tenant"));
    }

    #[test]
    fn header_name_validation() {
        assert!(is_valid_name("X-Api-Key"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Bad Header"));
        assert!(!is_valid_name("X:Colon"));
    }

    #[test]
    fn header_value_validation() {
        assert!(is_valid_value("Bearer abc.def"));
        assert!(is_valid_value("café"));
        assert!(is_valid_value("tab\tseparated"));
        assert!(!is_valid_value("line\r\nbreak"));
        assert!(!is_valid_value("nul\0byte"));
    }
}
