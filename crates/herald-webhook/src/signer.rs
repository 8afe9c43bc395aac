//! HMAC-SHA256 payload signing and secret generation.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::headers;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of generated signing secrets.
pub const SECRET_PREFIX: &str = "whsec_";

/// Prefix of the `X-Signature-256` header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

fn mac(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size")
}

/// Returns the hex-encoded HMAC-SHA256 of `payload` keyed with `secret`.
pub fn sign(secret: &str, payload: &[u8]) -> String {
    let mut mac = mac(secret);
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks a hex signature in constant time. Accepts both header conventions.
pub fn verify(secret: &str, payload: &[u8], signature: &str) -> bool {
    let signature = signature.strip_prefix(SIGNATURE_PREFIX).unwrap_or(signature);
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };

    let mut mac = mac(secret);
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Returns both signature headers for `payload`.
pub fn signature_headers(secret: &str, payload: &[u8]) -> [(&'static str, String); 2] {
    let signature = sign(secret, payload);
    let prefixed = format!("{SIGNATURE_PREFIX}{signature}");
    [
        (headers::SIGNATURE, signature),
        (headers::SIGNATURE_256, prefixed),
    ]
}

/// Number of random bytes in a generated secret.
const SECRET_BYTES: usize = 32;

/// Generates a new random signing secret: the prefix and 32 hex-encoded bytes.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    format!("{SECRET_PREFIX}{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] = br#"{"id":"evt_1","event":"order.created"}"#;

    #[test]
    fn known_vector() {
        let mut mac = HmacSha256::new_from_slice(b"abc123").unwrap();
        mac.update(PAYLOAD);
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(sign("abc123", PAYLOAD), expected);
        assert_eq!(sign("abc123", PAYLOAD).len(), 64);
    }

    #[test]
    fn rfc4231_case_2() {
        assert_eq!(
            sign("Jefe", b"what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn signing_is_deterministic() {
        assert_eq!(sign("abc123", PAYLOAD), sign("abc123", PAYLOAD));
    }

    #[test]
    fn one_byte_changes_the_digest() {
        let mut tampered = PAYLOAD.to_vec();
        tampered[2] = b'I';
        assert_ne!(sign("abc123", PAYLOAD), sign("abc123", &tampered));
    }

    #[test]
    fn both_headers_carry_the_same_digest() {
        let [(raw_name, raw), (prefixed_name, prefixed)] = signature_headers("abc123", PAYLOAD);

        assert_eq!(raw_name, "X-Signature");
        assert_eq!(prefixed_name, "X-Signature-256");
        assert_eq!(prefixed, format!("sha256={raw}"));
    }

    #[test]
    fn verify_accepts_either_convention() {
        let signature = sign("abc123", PAYLOAD);

        assert!(verify("abc123", PAYLOAD, &signature));
        assert!(verify("abc123", PAYLOAD, &format!("sha256={signature}")));
        assert!(!verify("other", PAYLOAD, &signature));
        assert!(!verify("abc123", PAYLOAD, "not-hex"));
    }

    #[test]
    fn generated_secrets() {
        let a = generate_secret();
        let b = generate_secret();

        assert!(a.starts_with(SECRET_PREFIX));
        assert_eq!(a.len(), SECRET_PREFIX.len() + 2 * SECRET_BYTES);
        assert!(hex::decode(&a[SECRET_PREFIX.len()..]).is_ok());
        assert_ne!(a, b);
    }
}
